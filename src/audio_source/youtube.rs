//! YouTube source implementation backed by yt-dlp.

use super::{VideoMetadata, VideoSource};
use crate::error::{PersonaLearnError, Result};
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, instrument};

fn video_id_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(
            r"(?x)
            (?:
                # Full YouTube URLs
                (?:https?://)?
                (?:www\.|m\.)?
                (?:youtube\.com/watch\?(?:.*&)?v=|youtu\.be/|youtube\.com/embed/|youtube\.com/shorts/)
                ([a-zA-Z0-9_-]{11})
            )
            |
            # Bare video ID (11 characters)
            ^([a-zA-Z0-9_-]{11})$
        ",
        )
        .expect("Invalid regex")
    })
}

/// Extract a video ID from a YouTube URL or bare ID.
pub fn extract_video_id(input: &str) -> Option<String> {
    let caps = video_id_regex().captures(input.trim())?;

    // Try group 1 (URL format) then group 2 (bare ID)
    caps.get(1)
        .or_else(|| caps.get(2))
        .map(|m| m.as_str().to_string())
}

/// Subset of `yt-dlp --dump-json` output that we use.
#[derive(Debug, Deserialize)]
struct YtDlpInfo {
    title: Option<String>,
    duration: Option<f64>,
    channel: Option<String>,
    uploader: Option<String>,
}

/// YouTube video source.
#[derive(Debug, Default, Clone)]
pub struct YoutubeSource;

impl YoutubeSource {
    pub fn new() -> Self {
        Self
    }

    fn watch_url(video_id: &str) -> String {
        format!("https://www.youtube.com/watch?v={}", video_id)
    }
}

#[async_trait]
impl VideoSource for YoutubeSource {
    #[instrument(skip(self))]
    async fn fetch_video(&self, id: &str) -> Result<VideoMetadata> {
        let video_id = extract_video_id(id).ok_or_else(|| {
            PersonaLearnError::InvalidInput(format!("Invalid YouTube video ID or URL: {}", id))
        })?;
        let url = Self::watch_url(&video_id);

        let output = tokio::process::Command::new("yt-dlp")
            .args(["--dump-json", "--no-download", "--no-warnings", "--no-playlist", &url])
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    PersonaLearnError::ToolNotFound("yt-dlp".to_string())
                } else {
                    PersonaLearnError::VideoSource(format!("Failed to run yt-dlp: {}", e))
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PersonaLearnError::VideoSource(format!(
                "Video {} not found or unavailable: {}",
                video_id, stderr
            )));
        }

        let info: YtDlpInfo = serde_json::from_slice(&output.stdout).map_err(|e| {
            PersonaLearnError::VideoSource(format!("Failed to parse yt-dlp output: {}", e))
        })?;
        debug!("Fetched metadata for {}", video_id);

        Ok(VideoMetadata {
            id: video_id,
            title: info.title.unwrap_or_else(|| "Unknown Title".to_string()),
            duration_seconds: info.duration.map(|d| d as u32),
            channel: info.channel.or(info.uploader),
            source_url: url,
        })
    }

    async fn download_audio(&self, video: &VideoMetadata, output_dir: &Path) -> Result<PathBuf> {
        crate::audio::download_audio(&video.source_url, &video.id, output_dir).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_video_id() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            extract_video_id("https://youtu.be/dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?list=PL1&v=dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(extract_video_id(" dQw4w9WgXcQ "), Some("dQw4w9WgXcQ".to_string()));

        assert_eq!(extract_video_id("not-a-video-id"), None);
        assert_eq!(extract_video_id(""), None);
    }
}
