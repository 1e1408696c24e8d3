//! Pre-flight checks before expensive operations.
//!
//! Validates that required tools and configuration are available
//! before starting operations that would otherwise fail midway.

use crate::config::Settings;
use crate::error::{PersonaLearnError, Result};
use crate::openai::require_api_key;
use std::process::Command;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Transcription requires tools and the OpenAI key.
    Transcribe,
    /// Recommendations additionally need the YouTube Data API key.
    Recommend,
    /// Reading a cached transcript needs nothing.
    CachedOnly,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Transcribe => {
            require_api_key()?;
            check_media_tools()?;
        }
        Operation::Recommend => {
            require_api_key()?;
            check_youtube_key(settings)?;
            check_media_tools()?;
        }
        Operation::CachedOnly => {}
    }
    Ok(())
}

fn check_media_tools() -> Result<()> {
    check_tool("yt-dlp")?;
    check_tool("ffmpeg")?;
    check_tool("ffprobe")
}

fn check_youtube_key(settings: &Settings) -> Result<()> {
    settings.youtube.resolve_api_key().map(|_| ()).ok_or_else(|| {
        PersonaLearnError::Config(
            "YouTube API key not set. Set youtube.api_key or export YOUTUBE_API_KEY".to_string(),
        )
    })
}

/// Check if an external tool is available.
pub fn check_tool(name: &str) -> Result<()> {
    // ffmpeg/ffprobe use -version (single dash), others use --version
    let version_arg = match name {
        "ffmpeg" | "ffprobe" => "-version",
        _ => "--version",
    };
    match Command::new(name).arg(version_arg).output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(PersonaLearnError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(PersonaLearnError::ToolNotFound(name.to_string()))
        }
        Err(e) => Err(PersonaLearnError::ToolNotFound(format!("{}: {}", name, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cached_only_has_no_requirements() {
        assert!(check(Operation::CachedOnly, &Settings::default()).is_ok());
    }

    #[test]
    fn test_missing_tool() {
        let err = check_tool("personalearn-no-such-tool").unwrap_err();
        assert!(matches!(err, PersonaLearnError::ToolNotFound(ref name) if name == "personalearn-no-such-tool"));
    }

    #[test]
    fn test_configured_youtube_key() {
        let mut settings = Settings::default();
        settings.youtube.api_key = Some("AIza-test".to_string());
        assert!(check_youtube_key(&settings).is_ok());
    }
}
