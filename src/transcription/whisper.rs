//! OpenAI Whisper speech-to-text implementation.

use super::srt::srt_millis;
use super::{Phrase, SpeechToText};
use crate::audio::split_audio;
use crate::error::{PersonaLearnError, Result};
use crate::openai::create_client;
use async_openai::types::{AudioInput, AudioResponseFormat, CreateTranscriptionRequestArgs};
use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use std::path::Path;
use tracing::{debug, info, instrument, warn};

/// A timed segment as returned by the API, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RawSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

/// OpenAI Whisper-based speech-to-text.
pub struct WhisperSpeechToText {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    chunk_duration_seconds: u32,
    max_concurrent_chunks: usize,
}

impl WhisperSpeechToText {
    /// Create a transcriber with custom configuration.
    pub fn with_config(
        model: &str,
        chunk_duration_seconds: u32,
        max_concurrent_chunks: usize,
    ) -> Result<Self> {
        Ok(Self {
            client: create_client()?,
            model: model.to_string(),
            chunk_duration_seconds,
            max_concurrent_chunks: max_concurrent_chunks.max(1),
        })
    }

    /// Transcribe a single audio file (no splitting).
    #[instrument(skip(self), fields(audio_path = %audio_path.display()))]
    async fn transcribe_single(&self, audio_path: &Path) -> Result<Vec<RawSegment>> {
        debug!("Transcribing audio file");

        let file_bytes = tokio::fs::read(audio_path).await?;
        let file_name = audio_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio.mp3")
            .to_string();

        let request = CreateTranscriptionRequestArgs::default()
            .file(AudioInput::from_vec_u8(file_name, file_bytes))
            .model(&self.model)
            .response_format(AudioResponseFormat::VerboseJson)
            .build()
            .map_err(|e| {
                PersonaLearnError::Transcription(format!("Failed to build request: {}", e))
            })?;

        let response = self
            .client
            .audio()
            .transcribe_verbose_json(request)
            .await
            .map_err(|e| PersonaLearnError::OpenAI(format!("Whisper API error: {}", e)))?;

        let segments = match response.segments {
            Some(segments) => segments
                .into_iter()
                .map(|s| RawSegment {
                    start: f64::from(s.start),
                    end: f64::from(s.end),
                    text: s.text,
                })
                .collect(),
            None => vec![RawSegment {
                start: 0.0,
                end: f64::from(response.duration),
                text: response.text,
            }],
        };

        debug!("Transcribed {} segments", segments.len());
        Ok(segments)
    }
}

#[async_trait]
impl SpeechToText for WhisperSpeechToText {
    #[instrument(skip(self), fields(audio_path = %audio_path.display()))]
    async fn transcribe(&self, audio_path: &Path) -> Result<Vec<Phrase>> {
        let temp_dir = tempfile::tempdir()?;
        let chunks = split_audio(audio_path, temp_dir.path(), self.chunk_duration_seconds).await?;
        info!("Transcribing {} audio chunk(s) with {}", chunks.len(), self.model);

        // `buffered` keeps chunk order while uploading several at once.
        let results: Vec<Vec<RawSegment>> = stream::iter(chunks)
            .map(|(chunk_path, offset)| async move {
                let segments = self.transcribe_single(&chunk_path).await.map_err(|e| {
                    let reason = format!("Chunk at {:.0}s failed: {}", offset, e);
                    PersonaLearnError::Transcription(reason)
                })?;
                Ok::<_, PersonaLearnError>(
                    segments
                        .into_iter()
                        .map(|s| RawSegment {
                            start: s.start + offset,
                            end: s.end + offset,
                            text: s.text,
                        })
                        .collect(),
                )
            })
            .buffered(self.max_concurrent_chunks)
            .try_collect()
            .await?;

        Ok(normalize_segments(results.into_iter().flatten().collect()))
    }
}

/// Turn raw API segments into phrases that satisfy the store invariant.
///
/// Text is trimmed, empty segments are dropped, and a segment that starts
/// before the previous one ended is moved to start where that one ended.
/// Segments that would collapse to zero length once written as SRT are
/// dropped as well, so a cached transcript reads back the same phrases.
pub(crate) fn normalize_segments(mut segments: Vec<RawSegment>) -> Vec<Phrase> {
    segments.sort_by(|a, b| a.start.total_cmp(&b.start));

    let mut phrases: Vec<Phrase> = Vec::with_capacity(segments.len());
    for segment in segments {
        let text = segment.text.trim();
        if text.is_empty() {
            continue;
        }

        let start = phrases
            .last()
            .map_or(segment.start, |prev| segment.start.max(prev.end()));

        if srt_millis(start) >= srt_millis(segment.end) {
            warn!(
                "Dropping segment {:.3}s..{:.3}s swallowed by its predecessor",
                segment.start, segment.end
            );
            continue;
        }

        match Phrase::new(start, segment.end, text) {
            Ok(phrase) => phrases.push(phrase),
            Err(e) => warn!("Dropping segment: {}", e),
        }
    }

    phrases
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcription::srt::{parse_srt, to_srt};
    use crate::transcription::PhraseStore;

    fn raw(start: f64, end: f64, text: &str) -> RawSegment {
        RawSegment {
            start,
            end,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_normalize_trims_and_drops_empty() {
        let phrases = normalize_segments(vec![raw(0.0, 2.0, "  Hello. "), raw(2.0, 3.0, "   ")]);
        assert_eq!(phrases.len(), 1);
        assert_eq!(phrases[0].text(), "Hello.");
    }

    #[test]
    fn test_normalize_resolves_overlap() {
        let phrases = normalize_segments(vec![
            raw(0.0, 5.2, "first"),
            raw(5.0, 9.0, "second"),
            raw(6.0, 9.0, "swallowed"),
            raw(9.0, 12.0, "third"),
        ]);

        let texts: Vec<&str> = phrases.iter().map(|p| p.text()).collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
        assert_eq!(phrases[1].start(), 5.2);
        assert!(PhraseStore::new("normalized", phrases).is_ok());
    }

    #[test]
    fn test_normalize_drops_sub_millisecond_slivers() {
        let phrases = normalize_segments(vec![
            raw(0.0, 5.0, "first"),
            raw(4.0, 5.0004, "sliver"),
            raw(5.0004, 8.0, "next"),
        ]);

        let texts: Vec<&str> = phrases.iter().map(|p| p.text()).collect();
        assert_eq!(texts, vec!["first", "next"]);

        let reparsed = parse_srt(&to_srt(&phrases)).unwrap();
        assert_eq!(reparsed.len(), phrases.len());
        assert!(PhraseStore::new("reparsed", reparsed).is_ok());
    }

    #[test]
    fn test_normalize_sorts_by_start() {
        let phrases = normalize_segments(vec![raw(10.0, 12.0, "later"), raw(0.0, 2.0, "earlier")]);
        assert_eq!(phrases[0].text(), "earlier");
        assert_eq!(phrases[1].text(), "later");
    }
}
