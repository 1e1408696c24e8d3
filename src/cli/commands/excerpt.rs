//! Excerpt command - read part of a transcript by time range.

use super::resolve_video_id;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::transcription::{format_timestamp, CachedTranscriber, TranscriptionProvider};
use anyhow::Result;

/// Run the excerpt command.
pub async fn run_excerpt(video: &str, start: f64, end: f64, settings: Settings) -> Result<()> {
    let video_id = resolve_video_id(video)?;
    let transcriber = CachedTranscriber::from_settings(&settings)?;

    let cached = transcriber.load_cached(&video_id).await?;
    let operation = if cached.is_some() {
        Operation::CachedOnly
    } else {
        Operation::Transcribe
    };
    if let Err(e) = preflight::check(operation, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'personalearn doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let store = match cached {
        Some(store) => store,
        None => {
            Output::info(&format!("{} is not transcribed yet, transcribing first", video_id));
            transcriber.transcribe(&video_id).await?
        }
    };

    let text = store.text_from(start, end)?;
    Output::info(&format!("{} - {}", format_timestamp(start), format_timestamp(end)));
    println!("{}", text);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings_with_cached_transcript(dir: &std::path::Path) -> Settings {
        let mut settings = Settings::default();
        settings.general.cache_dir = dir.to_string_lossy().into_owned();
        std::fs::create_dir_all(settings.transcriptions_dir()).unwrap();
        std::fs::write(
            settings.transcriptions_dir().join("abcdefghijk.srt"),
            "1\n00:00:00,000 --> 00:00:02,000\nHello.\n\n2\n00:00:02,000 --> 00:00:04,000\nWorld.\n\n",
        )
        .unwrap();
        settings
    }

    #[tokio::test]
    async fn test_cached_transcript_skips_tool_checks() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_with_cached_transcript(dir.path());

        assert!(run_excerpt("abcdefghijk", 0.5, 3.0, settings).await.is_ok());
    }

    #[tokio::test]
    async fn test_range_outside_cached_transcript() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_with_cached_transcript(dir.path());

        assert!(run_excerpt("abcdefghijk", 10.0, 20.0, settings).await.is_err());
    }
}
