//! YouTube Data API v3 search provider.

use super::{SearchHit, SearchItemKind, SearchProvider, VideoStats};
use crate::config::YoutubeSettings;
use crate::error::{PersonaLearnError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/youtube/v3/";
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchItemId,
    snippet: Option<SearchSnippet>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItemId {
    kind: String,
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchSnippet {
    #[serde(default)]
    title: String,
    channel_title: Option<String>,
    published_at: Option<DateTime<Utc>>,
    thumbnails: Option<Thumbnails>,
}

#[derive(Debug, Deserialize)]
struct Thumbnails {
    default: Option<Thumbnail>,
    medium: Option<Thumbnail>,
    high: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

#[derive(Debug, Deserialize)]
struct VideosResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
struct VideoItem {
    snippet: Option<VideoSnippet>,
    statistics: Option<Statistics>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoSnippet {
    channel_id: Option<String>,
    channel_title: Option<String>,
    category_id: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Statistics {
    view_count: Option<String>,
    favorite_count: Option<String>,
}

impl From<SearchItem> for SearchHit {
    fn from(item: SearchItem) -> Self {
        let (title, channel_title, published_at, thumbnails) = match item.snippet {
            Some(s) => (s.title, s.channel_title, s.published_at, s.thumbnails),
            None => (String::new(), None, None, None),
        };

        SearchHit {
            kind: SearchItemKind::from_api(&item.id.kind),
            video_id: item.id.video_id,
            title,
            thumbnail_url: thumbnails
                .and_then(|t| t.default.or(t.medium).or(t.high))
                .map(|t| t.url),
            channel_title,
            published_at,
        }
    }
}

impl From<VideoItem> for VideoStats {
    fn from(item: VideoItem) -> Self {
        let mut stats = VideoStats::default();
        if let Some(snippet) = item.snippet {
            stats.channel_id = snippet.channel_id;
            stats.channel_title = snippet.channel_title;
            stats.category_id = snippet.category_id;
            stats.tags = snippet.tags;
        }
        if let Some(statistics) = item.statistics {
            stats.view_count = statistics.view_count;
            stats.favorite_count = statistics.favorite_count;
        }
        stats
    }
}

/// Search provider backed by the YouTube Data API.
pub struct YouTubeDataApi {
    client: reqwest::Client,
    api_key: String,
    base_url: Url,
}

impl YouTubeDataApi {
    /// Create a client for the public API endpoint.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Create a client against another endpoint (proxies, test servers).
    pub fn with_base_url(api_key: impl Into<String>, base_url: &str) -> Result<Self> {
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };
        let base_url = Url::parse(&normalized).map_err(|e| {
            PersonaLearnError::Config(format!("Invalid YouTube API URL {}: {}", base_url, e))
        })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url,
        })
    }

    /// Create a client from settings, resolving the key from config or environment.
    pub fn from_settings(settings: &YoutubeSettings) -> Result<Self> {
        let api_key = settings.resolve_api_key().ok_or_else(|| {
            PersonaLearnError::Config(
                "YouTube API key not set. Set youtube.api_key or export YOUTUBE_API_KEY".to_string(),
            )
        })?;
        Self::new(api_key)
    }

    fn endpoint(&self, name: &str) -> Result<Url> {
        self.base_url
            .join(name)
            .map_err(|e| {
                PersonaLearnError::Config(format!("Invalid YouTube API endpoint {}: {}", name, e))
            })
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<T> {
        let response = self
            .client
            .get(self.endpoint(endpoint)?)
            .query(params)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PersonaLearnError::YouTubeApi(format!(
                "{} returned {}: {}",
                endpoint, status, body
            )));
        }

        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl SearchProvider for YouTubeDataApi {
    #[instrument(skip(self))]
    async fn search(&self, query: &str, max_results: usize, order: &str) -> Result<Vec<SearchHit>> {
        let max_results = max_results.to_string();
        let response: SearchResponse = self
            .get(
                "search",
                &[
                    ("part", "id,snippet"),
                    ("type", "video"),
                    ("q", query),
                    ("order", order),
                    ("maxResults", max_results.as_str()),
                ],
            )
            .await?;

        debug!("YouTube search returned {} items", response.items.len());
        Ok(response.items.into_iter().map(SearchHit::from).collect())
    }

    #[instrument(skip(self))]
    async fn video_stats(&self, video_id: &str) -> Result<Option<VideoStats>> {
        let response: VideosResponse = self
            .get("videos", &[("part", "statistics,snippet"), ("id", video_id)])
            .await?;

        Ok(response.items.into_iter().next().map(VideoStats::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEARCH_JSON: &str = r#"{
        "kind": "youtube#searchListResponse",
        "items": [
            {
                "kind": "youtube#searchResult",
                "id": {"kind": "youtube#video", "videoId": "dQw4w9WgXcQ"},
                "snippet": {
                    "publishedAt": "2021-03-04T15:00:00Z",
                    "title": "Recursion in 5 minutes",
                    "channelTitle": "CS Explained",
                    "thumbnails": {
                        "default": {"url": "https://i.ytimg.com/vi/dQw4w9WgXcQ/default.jpg", "width": 120, "height": 90},
                        "high": {"url": "https://i.ytimg.com/vi/dQw4w9WgXcQ/hqdefault.jpg"}
                    }
                }
            },
            {
                "kind": "youtube#searchResult",
                "id": {"kind": "youtube#channel", "channelId": "UC123"},
                "snippet": {"title": "CS Explained"}
            }
        ]
    }"#;

    const VIDEOS_JSON: &str = r#"{
        "items": [{
            "id": "dQw4w9WgXcQ",
            "snippet": {"channelId": "UC123", "channelTitle": "CS Explained", "categoryId": "27", "tags": ["recursion"]},
            "statistics": {"viewCount": "123456", "likeCount": "789", "favoriteCount": "0"}
        }]
    }"#;

    #[test]
    fn test_search_response_to_hits() {
        let response: SearchResponse = serde_json::from_str(SEARCH_JSON).unwrap();
        let hits: Vec<SearchHit> = response.items.into_iter().map(SearchHit::from).collect();

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].kind, SearchItemKind::Video);
        assert_eq!(hits[0].video_id.as_deref(), Some("dQw4w9WgXcQ"));
        assert_eq!(hits[0].title, "Recursion in 5 minutes");
        assert_eq!(
            hits[0].thumbnail_url.as_deref(),
            Some("https://i.ytimg.com/vi/dQw4w9WgXcQ/default.jpg")
        );
        assert_eq!(hits[0].published_at.map(|d| d.timestamp()), Some(1614870000));

        assert_eq!(hits[1].kind, SearchItemKind::Channel);
        assert_eq!(hits[1].video_id, None);
    }

    #[test]
    fn test_videos_response_to_stats() {
        let response: VideosResponse = serde_json::from_str(VIDEOS_JSON).unwrap();
        let stats = response.items.into_iter().next().map(VideoStats::from).unwrap();

        assert_eq!(stats.channel_title.as_deref(), Some("CS Explained"));
        assert_eq!(stats.view_count.as_deref(), Some("123456"));
        assert_eq!(stats.favorite_count.as_deref(), Some("0"));
        assert_eq!(stats.tags, vec!["recursion".to_string()]);
    }

    #[test]
    fn test_empty_videos_response() {
        let response: VideosResponse = serde_json::from_str(r#"{"items": []}"#).unwrap();
        assert!(response.items.is_empty());
        let response: VideosResponse = serde_json::from_str("{}").unwrap();
        assert!(response.items.is_empty());
    }

    #[test]
    fn test_endpoint_joins_base_url() {
        let api = YouTubeDataApi::with_base_url("key", "http://localhost:8080/youtube/v3").unwrap();
        assert_eq!(
            api.endpoint("search").unwrap().as_str(),
            "http://localhost:8080/youtube/v3/search"
        );
        assert!(YouTubeDataApi::with_base_url("key", "not a url").is_err());
    }
}
