//! Supplementary resource lookup.
//!
//! [`ResourceRecommender`] asks a [`SearchProvider`] for videos matching a
//! query and enriches each hit with channel and view statistics. Statistics
//! are best effort: a failed lookup leaves the fields empty and keeps the hit.

mod youtube;

pub use youtube::YouTubeDataApi;

use crate::config::Settings;
use crate::error::{PersonaLearnError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Largest page the YouTube search endpoint returns.
pub const MAX_SEARCH_RESULTS: usize = 50;

/// What a search result points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchItemKind {
    Video,
    Channel,
    Playlist,
    Other,
}

impl SearchItemKind {
    /// Map a YouTube `kind` string such as `youtube#video`.
    pub fn from_api(kind: &str) -> Self {
        match kind {
            "youtube#video" => SearchItemKind::Video,
            "youtube#channel" => SearchItemKind::Channel,
            "youtube#playlist" => SearchItemKind::Playlist,
            _ => SearchItemKind::Other,
        }
    }
}

/// A single search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub kind: SearchItemKind,
    pub video_id: Option<String>,
    pub title: String,
    pub thumbnail_url: Option<String>,
    pub channel_title: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

/// Statistics for one video. Counts are kept as the API reports them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoStats {
    pub channel_id: Option<String>,
    pub channel_title: Option<String>,
    pub category_id: Option<String>,
    pub favorite_count: Option<String>,
    pub view_count: Option<String>,
    pub tags: Vec<String>,
}

/// A recommended video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub video_id: String,
    pub title: String,
    /// Empty when the search result carried no thumbnail.
    pub thumbnail_url: String,
    pub channel_title: Option<String>,
    pub view_count: Option<String>,
}

/// Trait for video search services.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Search for `query`, returning at most `max_results` hits in ranked order.
    async fn search(&self, query: &str, max_results: usize, order: &str) -> Result<Vec<SearchHit>>;

    /// Statistics for a video, or `None` when the service knows nothing about it.
    async fn video_stats(&self, video_id: &str) -> Result<Option<VideoStats>>;
}

/// Finds videos that address a search query.
pub struct ResourceRecommender {
    provider: Arc<dyn SearchProvider>,
    order: String,
}

impl ResourceRecommender {
    pub fn new(provider: Arc<dyn SearchProvider>, order: impl Into<String>) -> Self {
        Self {
            provider,
            order: order.into(),
        }
    }

    /// Create the production recommender (YouTube Data API) from settings.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let api = YouTubeDataApi::from_settings(&settings.youtube)?;
        Ok(Self::new(Arc::new(api), settings.youtube.order.as_str()))
    }

    /// Up to `max_count` videos for `query`, never including `exclude_video_id`.
    #[instrument(skip(self))]
    pub async fn recommend(
        &self,
        query: &str,
        max_count: usize,
        exclude_video_id: Option<&str>,
    ) -> Result<Vec<Resource>> {
        if max_count == 0 {
            return Ok(Vec::new());
        }

        // One extra result makes room for the excluded video.
        let requested =
            (max_count + usize::from(exclude_video_id.is_some())).min(MAX_SEARCH_RESULTS);

        let hits = self
            .provider
            .search(query, requested, &self.order)
            .await
            .map_err(|e| PersonaLearnError::Recommendation(e.to_string()))?;
        debug!("Search returned {} hits", hits.len());

        let videos: Vec<(String, SearchHit)> = hits
            .into_iter()
            .filter(|hit| hit.kind == SearchItemKind::Video)
            .filter_map(|hit| hit.video_id.clone().map(|id| (id, hit)))
            .filter(|(id, _)| Some(id.as_str()) != exclude_video_id)
            .take(max_count)
            .collect();

        let stats = join_all(videos.iter().map(|(id, _)| self.stats_for(id))).await;

        Ok(videos
            .into_iter()
            .zip(stats)
            .map(|((video_id, hit), stats)| Resource {
                video_id,
                title: hit.title,
                thumbnail_url: hit.thumbnail_url.unwrap_or_default(),
                channel_title: stats.as_ref().and_then(|s| s.channel_title.clone()),
                view_count: stats.and_then(|s| s.view_count),
            })
            .collect())
    }

    async fn stats_for(&self, video_id: &str) -> Option<VideoStats> {
        match self.provider.video_stats(video_id).await {
            Ok(Some(stats)) => Some(stats),
            Ok(None) => {
                warn!("Could not get statistics for video with ID: {}", video_id);
                None
            }
            Err(e) => {
                warn!("Statistics lookup for {} failed: {}", video_id, e);
                None
            }
        }
    }
}
