//! Transcription module for PersonaLearn.
//!
//! Turns a video id into a [`PhraseStore`]: the phrase-level transcript used
//! for time-range lookups.
//!
//! - [`SpeechToText`] converts an audio file into timed phrases (Whisper).
//! - [`TranscriptionProvider`] resolves a video id to a transcript. The
//!   production provider, [`CachedTranscriber`], keeps SRT files on disk and
//!   only downloads and transcribes on a cache miss.

mod cache;
mod models;
pub mod srt;
mod whisper;

pub use cache::CachedTranscriber;
pub use models::{format_timestamp, Phrase, PhraseStore};
pub use whisper::WhisperSpeechToText;

use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Trait for speech-to-text services.
#[async_trait]
pub trait SpeechToText: Send + Sync {
    /// Transcribe an audio file into ordered, non-overlapping phrases.
    async fn transcribe(&self, audio_path: &Path) -> Result<Vec<Phrase>>;
}

/// Trait for anything that can produce the transcript of a video.
#[async_trait]
pub trait TranscriptionProvider: Send + Sync {
    /// Produce the phrase store for `video_id`.
    async fn transcribe(&self, video_id: &str) -> Result<PhraseStore>;
}
