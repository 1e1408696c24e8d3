//! CLI command implementations.

mod config;
mod doctor;
mod excerpt;
mod recommend;
mod serve;
mod transcribe;

pub use config::run_config;
pub use doctor::run_doctor;
pub use excerpt::run_excerpt;
pub use recommend::run_recommend;
pub use serve::run_serve;
pub use transcribe::run_transcribe;

use crate::audio_source::extract_video_id;
use crate::error::PersonaLearnError;

/// Video id from a command-line argument (bare id or YouTube URL).
fn resolve_video_id(input: &str) -> Result<String, PersonaLearnError> {
    extract_video_id(input).ok_or_else(|| {
        PersonaLearnError::InvalidInput(format!("Invalid YouTube video ID or URL: {}", input))
    })
}
