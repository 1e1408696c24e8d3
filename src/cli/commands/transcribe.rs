//! Transcribe command implementation.

use super::resolve_video_id;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::transcription::{srt, CachedTranscriber, TranscriptionProvider};
use anyhow::Result;

/// Run the transcribe command.
pub async fn run_transcribe(video: &str, output: Option<String>, settings: Settings) -> Result<()> {
    let video_id = resolve_video_id(video)?;
    let transcriber = CachedTranscriber::from_settings(&settings)?;

    if !transcriber.is_cached(&video_id) {
        if let Err(e) = preflight::check(Operation::Transcribe, &settings) {
            Output::error(&format!("{}", e));
            Output::info("Run 'personalearn doctor' for detailed diagnostics.");
            return Err(e.into());
        }
    }

    let spinner = Output::spinner(&format!("Transcribing {}...", video_id));
    let result = transcriber.transcribe(&video_id).await;
    spinner.finish_and_clear();
    let store = result?;

    Output::transcript_info(store.title(), &video_id, store.len(), store.duration());

    let content = srt::to_srt(store.phrases());
    match output {
        Some(path) => {
            let path = Settings::expand_path(&path);
            std::fs::write(&path, content)?;
            Output::success(&format!("Transcript written to {}", path.display()));
        }
        None => print!("{}", content),
    }

    Ok(())
}
