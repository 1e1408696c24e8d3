//! Error types for PersonaLearn.

use thiserror::Error;

/// Library-level error type for PersonaLearn operations.
#[derive(Error, Debug)]
pub enum PersonaLearnError {
    #[error("Invalid range: start {start}s is after end {end}s")]
    InvalidRange { start: f64, end: f64 },

    #[error("Range {start}s..{end}s lies outside the transcript")]
    OutOfRange { start: f64, end: f64 },

    #[error("Query derivation failed: {0}")]
    QueryDerivation(String),

    #[error("Resource recommendation failed: {0}")]
    Recommendation(String),

    #[error("No transcript could be produced: {0}")]
    TranscriptionFatal(String),

    #[error("{operation} timed out after {seconds}s")]
    Timeout { operation: String, seconds: f64 },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid phrase: {0}")]
    InvalidPhrase(String),

    #[error("Invalid transcript: {0}")]
    InvalidTranscript(String),

    #[error("Subtitle parse error on line {line}: {reason}")]
    SubtitleParse { line: usize, reason: String },

    #[error("Media source error: {0}")]
    VideoSource(String),

    #[error("Audio download failed: {0}")]
    AudioDownload(String),

    #[error("Transcription failed: {0}")]
    Transcription(String),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("YouTube API error: {0}")]
    YouTubeApi(String),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl PersonaLearnError {
    /// Whether this error only invalidates a single transcript segment.
    ///
    /// The pipeline drops such segments instead of failing the whole request.
    pub fn is_segment_fatal(&self) -> bool {
        matches!(
            self,
            PersonaLearnError::InvalidRange { .. }
                | PersonaLearnError::OutOfRange { .. }
                | PersonaLearnError::QueryDerivation(_)
                | PersonaLearnError::Recommendation(_)
                | PersonaLearnError::Timeout { .. }
        )
    }
}

/// Result type alias for PersonaLearn operations.
pub type Result<T> = std::result::Result<T, PersonaLearnError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_segment_fatal_classification() {
        assert!(PersonaLearnError::OutOfRange { start: 1.0, end: 2.0 }.is_segment_fatal());
        assert!(PersonaLearnError::QueryDerivation("empty".into()).is_segment_fatal());
        assert!(PersonaLearnError::Timeout {
            operation: "search".into(),
            seconds: 5.0
        }
        .is_segment_fatal());

        assert!(!PersonaLearnError::TranscriptionFatal("gone".into()).is_segment_fatal());
        assert!(!PersonaLearnError::InvalidInput("bad id".into()).is_segment_fatal());
    }

    #[test]
    fn test_error_messages() {
        let err = PersonaLearnError::InvalidRange { start: 9.0, end: 2.0 };
        assert_eq!(err.to_string(), "Invalid range: start 9s is after end 2s");

        let err = PersonaLearnError::Timeout {
            operation: "YouTube search".into(),
            seconds: 30.0,
        };
        assert_eq!(err.to_string(), "YouTube search timed out after 30s");

        let err = PersonaLearnError::Timeout {
            operation: "query derivation".into(),
            seconds: Duration::from_millis(250).as_secs_f64(),
        };
        assert_eq!(err.to_string(), "query derivation timed out after 0.25s");
    }
}
