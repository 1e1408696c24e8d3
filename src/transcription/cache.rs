//! On-disk transcription cache.
//!
//! Layout under the cache directory:
//!
//! - `videos/<id>-XXXX/` private per-request download directory, removed once
//!   the audio has been transcribed
//! - `transcriptions/<id>.srt` published transcript
//!
//! A transcript is written to a temporary file next to its final path and
//! renamed into place, so readers never observe a half-written file and
//! concurrent requests for the same video can race safely.

use super::{srt, PhraseStore, SpeechToText, TranscriptionProvider, WhisperSpeechToText};
use crate::audio_source::{VideoMetadata, VideoSource, YoutubeSource};
use crate::config::Settings;
use crate::error::{PersonaLearnError, Result};
use async_trait::async_trait;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Transcription provider backed by SRT files on disk.
pub struct CachedTranscriber {
    source: Arc<dyn VideoSource>,
    speech: Arc<dyn SpeechToText>,
    videos_dir: PathBuf,
    transcriptions_dir: PathBuf,
}

impl CachedTranscriber {
    /// Create a provider from explicit components.
    pub fn new(
        source: Arc<dyn VideoSource>,
        speech: Arc<dyn SpeechToText>,
        videos_dir: PathBuf,
        transcriptions_dir: PathBuf,
    ) -> Self {
        Self {
            source,
            speech,
            videos_dir,
            transcriptions_dir,
        }
    }

    /// Create the production provider (yt-dlp + Whisper) from settings.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let speech = WhisperSpeechToText::with_config(
            &settings.transcription.model,
            settings.transcription.chunk_duration_seconds,
            settings.transcription.max_concurrent_chunks,
        )?;

        Ok(Self::new(
            Arc::new(YoutubeSource::new()),
            Arc::new(speech),
            settings.videos_dir(),
            settings.transcriptions_dir(),
        ))
    }

    /// Path of the published transcript for a video.
    pub fn transcription_path(&self, video_id: &str) -> PathBuf {
        self.transcriptions_dir.join(format!("{}.srt", video_id))
    }

    /// Whether a transcript for `video_id` has already been published.
    pub fn is_cached(&self, video_id: &str) -> bool {
        self.transcription_path(video_id).exists()
    }

    /// The published transcript for `video_id`, without contacting the video source.
    ///
    /// The store is titled with the video id since no metadata is fetched.
    pub async fn load_cached(&self, video_id: &str) -> Result<Option<PhraseStore>> {
        let path = self.transcription_path(video_id);
        if !path.exists() {
            return Ok(None);
        }
        self.load(&path, video_id).await.map(Some)
    }

    async fn load(&self, path: &Path, title: &str) -> Result<PhraseStore> {
        let content = tokio::fs::read_to_string(path).await?;
        PhraseStore::new(title, srt::parse_srt(&content)?)
    }

    /// Download, transcribe and publish a transcript.
    async fn transcribe_fresh(&self, video: &VideoMetadata) -> Result<PhraseStore> {
        tokio::fs::create_dir_all(&self.videos_dir).await?;
        let download_dir = tempfile::Builder::new()
            .prefix(&format!("{}-", video.id))
            .tempdir_in(&self.videos_dir)?;

        let audio_path = self.source.download_audio(video, download_dir.path()).await?;
        let phrases = self.speech.transcribe(&audio_path).await?;
        info!("Transcription complete. Deleting audio for {}", video.id);
        drop(download_dir);

        if phrases.is_empty() {
            return Err(PersonaLearnError::Transcription(format!(
                "no speech detected in {}",
                video.id
            )));
        }

        let store = PhraseStore::new(video.title.as_str(), phrases)?;
        self.publish(&self.transcription_path(&video.id), &store)?;
        Ok(store)
    }

    /// Atomically write a transcript to `path`.
    fn publish(&self, path: &Path, store: &PhraseStore) -> Result<()> {
        std::fs::create_dir_all(&self.transcriptions_dir)?;

        let mut file = tempfile::NamedTempFile::new_in(&self.transcriptions_dir)?;
        file.write_all(srt::to_srt(store.phrases()).as_bytes())?;
        file.as_file().sync_all()?;
        file.persist(path).map_err(|e| PersonaLearnError::Io(e.error))?;

        debug!("Published transcript to {}", path.display());
        Ok(())
    }
}

#[async_trait]
impl TranscriptionProvider for CachedTranscriber {
    #[instrument(skip(self))]
    async fn transcribe(&self, video_id: &str) -> Result<PhraseStore> {
        let video = self.source.fetch_video(video_id).await?;
        let path = self.transcription_path(&video.id);

        if path.exists() {
            debug!("Transcription for {} found in {}", video.id, self.transcriptions_dir.display());
            return self.load(&path, &video.title).await;
        }

        info!("Transcription for {} not cached, downloading and transcribing", video.id);
        self.transcribe_fresh(&video).await
    }
}
