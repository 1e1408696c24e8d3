//! Video source abstraction for PersonaLearn.
//!
//! A video source resolves metadata for a video id and fetches its audio track.

mod youtube;

pub use youtube::{extract_video_id, YoutubeSource};

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Metadata about a source video.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoMetadata {
    /// Unique identifier.
    pub id: String,
    pub title: String,
    /// Duration in seconds (if known).
    pub duration_seconds: Option<u32>,
    /// Channel or author name (if available).
    pub channel: Option<String>,
    /// Watch URL handed to the downloader.
    pub source_url: String,
}

/// Trait for video providers.
#[async_trait]
pub trait VideoSource: Send + Sync {
    /// Fetch metadata for a video by ID.
    async fn fetch_video(&self, id: &str) -> Result<VideoMetadata>;

    /// Download the audio track of a video into `output_dir`.
    async fn download_audio(&self, video: &VideoMetadata, output_dir: &Path) -> Result<PathBuf>;
}
