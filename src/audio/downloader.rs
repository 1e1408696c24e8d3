//! Audio download and splitting utilities.
//!
//! Downloads go through yt-dlp, splitting through ffmpeg's segment muxer.

use crate::error::{PersonaLearnError, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, instrument};

/// Download the audio track of `url` as `<output_dir>/<video_id>.mp3`.
///
/// `output_dir` should be private to the caller; nothing here guards against
/// two downloads writing into the same directory.
#[instrument(skip(output_dir), fields(video_id = %video_id))]
pub async fn download_audio(url: &str, video_id: &str, output_dir: &Path) -> Result<PathBuf> {
    tokio::fs::create_dir_all(output_dir).await?;

    let target_path = output_dir.join(format!("{}.mp3", video_id));
    let template = output_dir.join(format!("{}.%(ext)s", video_id));

    info!("Downloading audio from {}", url);

    let result = Command::new("yt-dlp")
        .arg("--extract-audio")
        .arg("--audio-format")
        .arg("mp3")
        .arg("--audio-quality")
        .arg("5")
        .arg("--output")
        .arg(&template)
        .arg("--no-playlist")
        .arg("--quiet")
        .arg("--no-warnings")
        .arg(url)
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await;

    let output = match result {
        Ok(o) => o,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(PersonaLearnError::ToolNotFound("yt-dlp".into()));
        }
        Err(e) => {
            return Err(PersonaLearnError::AudioDownload(format!(
                "yt-dlp execution failed: {e}"
            )));
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(PersonaLearnError::AudioDownload(format!(
            "yt-dlp failed: {stderr}"
        )));
    }

    if !target_path.exists() {
        return Err(PersonaLearnError::AudioDownload(
            "Audio file not found after download".into(),
        ));
    }

    Ok(target_path)
}

/// Split an audio file into pieces of roughly `chunk_seconds`.
///
/// Returns `(path, offset_seconds)` pairs in playback order. Audio no longer
/// than one chunk is returned as-is with offset zero.
#[instrument(skip_all)]
pub async fn split_audio(
    source: &Path,
    output_dir: &Path,
    chunk_seconds: u32,
) -> Result<Vec<(PathBuf, f64)>> {
    let total_duration = probe_duration(source).await?;
    info!("Total audio duration: {:.1}s", total_duration);

    let chunk_len = f64::from(chunk_seconds.max(1));
    if total_duration <= chunk_len {
        return Ok(vec![(source.to_path_buf(), 0.0)]);
    }

    tokio::fs::create_dir_all(output_dir).await?;
    let pattern = output_dir.join("part_%04d.mp3");

    let result = Command::new("ffmpeg")
        .arg("-i")
        .arg(source)
        .arg("-vn")
        .arg("-f")
        .arg("segment")
        .arg("-segment_time")
        .arg(chunk_seconds.max(1).to_string())
        .arg("-reset_timestamps")
        .arg("1")
        .arg("-codec:a")
        .arg("libmp3lame")
        .arg("-qscale:a")
        .arg("5")
        .arg("-y")
        .arg("-loglevel")
        .arg("error")
        .arg(&pattern)
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await;

    match result {
        Ok(out) if out.status.success() => {}
        Ok(out) => {
            let err = String::from_utf8_lossy(&out.stderr);
            return Err(PersonaLearnError::AudioDownload(format!(
                "ffmpeg split failed: {err}"
            )));
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(PersonaLearnError::ToolNotFound("ffmpeg".into()));
        }
        Err(e) => return Err(PersonaLearnError::AudioDownload(format!("ffmpeg error: {e}"))),
    }

    let mut parts: Vec<PathBuf> = std::fs::read_dir(output_dir)?
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("part_") && n.ends_with(".mp3"))
        })
        .collect();
    parts.sort();

    let segments: Vec<(PathBuf, f64)> = parts
        .into_iter()
        .enumerate()
        .map(|(idx, path)| (path, idx as f64 * chunk_len))
        .collect();

    debug!("Created {} audio segments", segments.len());
    Ok(segments)
}

/// Query the duration of an audio file using ffprobe with JSON output.
async fn probe_duration(path: &Path) -> Result<f64> {
    let result = Command::new("ffprobe")
        .arg("-v")
        .arg("quiet")
        .arg("-print_format")
        .arg("json")
        .arg("-show_format")
        .arg(path)
        .output()
        .await;

    let output = match result {
        Ok(o) => o,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(PersonaLearnError::ToolNotFound("ffprobe".into()));
        }
        Err(e) => {
            return Err(PersonaLearnError::AudioDownload(format!("ffprobe failed: {e}")));
        }
    };

    if !output.status.success() {
        return Err(PersonaLearnError::AudioDownload("ffprobe returned error".into()));
    }

    parse_probe_duration(&output.stdout)
}

#[derive(serde::Deserialize)]
struct ProbeOutput {
    format: ProbeFormat,
}

#[derive(serde::Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

fn parse_probe_duration(stdout: &[u8]) -> Result<f64> {
    let parsed: ProbeOutput = serde_json::from_slice(stdout)
        .map_err(|_| PersonaLearnError::AudioDownload("Invalid ffprobe output".into()))?;

    parsed
        .format
        .duration
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| {
            PersonaLearnError::AudioDownload("Could not determine audio duration".into())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_probe_duration() {
        let json = br#"{"format": {"filename": "a.mp3", "duration": "123.456000"}}"#;
        assert_eq!(parse_probe_duration(json).unwrap(), 123.456);
    }

    #[test]
    fn test_parse_probe_duration_missing() {
        assert!(parse_probe_duration(br#"{"format": {}}"#).is_err());
        assert!(parse_probe_duration(b"garbage").is_err());
    }
}
