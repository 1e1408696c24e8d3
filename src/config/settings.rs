//! Configuration settings for PersonaLearn.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub transcription: TranscriptionSettings,
    pub query: QuerySettings,
    pub youtube: YoutubeSettings,
    pub pipeline: PipelineSettings,
    pub server: ServerSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory holding downloaded audio and cached transcriptions.
    pub cache_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        let cache_dir = dirs::cache_dir()
            .map(|d| d.join("personalearn").to_string_lossy().to_string())
            .unwrap_or_else(|| "~/.cache/personalearn".to_string());

        Self {
            cache_dir,
            log_level: "warn".to_string(),
        }
    }
}

/// Speech-to-text settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionSettings {
    /// Whisper model to use.
    pub model: String,
    /// Audio longer than this is split before upload.
    pub chunk_duration_seconds: u32,
    /// Maximum concurrent chunk uploads.
    pub max_concurrent_chunks: usize,
    /// Budget for a full download + transcription of one video.
    pub timeout_seconds: u64,
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            model: "whisper-1".to_string(),
            chunk_duration_seconds: 600,
            max_concurrent_chunks: 3,
            timeout_seconds: 1800,
        }
    }
}

/// How a single query is picked from the generated candidates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CandidatePolicy {
    /// The first candidate, in generation order.
    #[default]
    First,
    /// The shortest candidate (ties resolved by generation order).
    Shortest,
    /// The longest candidate (ties resolved by generation order).
    Longest,
}

impl std::str::FromStr for CandidatePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "first" => Ok(CandidatePolicy::First),
            "shortest" => Ok(CandidatePolicy::Shortest),
            "longest" => Ok(CandidatePolicy::Longest),
            _ => Err(format!("Unknown candidate policy: {}", s)),
        }
    }
}

impl std::fmt::Display for CandidatePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CandidatePolicy::First => write!(f, "first"),
            CandidatePolicy::Shortest => write!(f, "shortest"),
            CandidatePolicy::Longest => write!(f, "longest"),
        }
    }
}

/// Sampling parameters sent with every query generation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingSettings {
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
}

impl Default for SamplingSettings {
    fn default() -> Self {
        Self {
            temperature: 0.3,
            max_tokens: 400,
            top_p: 0.98,
            frequency_penalty: 0.7,
            presence_penalty: 0.0,
        }
    }
}

/// Search query generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuerySettings {
    /// Completion model used to turn excerpts into search queries.
    pub model: String,
    /// Number of candidate completions to request.
    pub candidates: u8,
    /// Which candidate becomes the search query.
    pub candidate_policy: CandidatePolicy,
    /// Optional prompt template file (overrides the built-in prompt).
    pub template_path: Option<String>,
    pub sampling: SamplingSettings,
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            model: "gpt-3.5-turbo-instruct".to_string(),
            candidates: 1,
            candidate_policy: CandidatePolicy::First,
            template_path: None,
            sampling: SamplingSettings::default(),
        }
    }
}

/// YouTube Data API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct YoutubeSettings {
    /// YouTube Data API key. Falls back to `YOUTUBE_API_KEY`.
    pub api_key: Option<String>,
    /// Search ordering mode (relevance, date, rating, viewCount, title).
    pub order: String,
}

impl Default for YoutubeSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            order: "relevance".to_string(),
        }
    }
}

impl YoutubeSettings {
    /// Resolve the API key from config or environment.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var("YOUTUBE_API_KEY").ok().filter(|k| !k.is_empty()))
    }
}

/// Recommendation pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Seconds of transcript taken on each side of a confusion timestamp.
    pub buffer_seconds: f64,
    /// Comprehension values strictly below this mark a confusing moment.
    pub confusion_threshold: f64,
    /// Maximum number of resources per recommendation.
    pub max_resources: usize,
    /// Segments processed concurrently.
    pub max_concurrent_segments: usize,
    /// Timeout applied to each query generation and search call.
    pub call_timeout_seconds: u64,
    /// Drop failing segments instead of failing the whole request.
    pub isolate_segment_failures: bool,
    /// Never recommend the video the learner is already watching.
    pub exclude_source_video: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            buffer_seconds: 5.0,
            confusion_threshold: -0.5,
            max_resources: 5,
            max_concurrent_segments: 4,
            call_timeout_seconds: 120,
            isolate_segment_failures: true,
            exclude_source_video: true,
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
        }
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::PersonaLearnError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("personalearn")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded cache directory path.
    pub fn cache_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.cache_dir)
    }

    /// Directory where audio is downloaded before transcription.
    pub fn videos_dir(&self) -> PathBuf {
        self.cache_dir().join("videos")
    }

    /// Directory holding published subtitle files.
    pub fn transcriptions_dir(&self) -> PathBuf {
        self.cache_dir().join("transcriptions")
    }

    /// Expanded prompt template path, if configured.
    pub fn template_path(&self) -> Option<PathBuf> {
        self.query.template_path.as_deref().map(Self::expand_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_round_trip_through_toml() {
        let settings = Settings::default();
        let text = toml::to_string_pretty(&settings).unwrap();
        let parsed: Settings = toml::from_str(&text).unwrap();

        assert_eq!(parsed.pipeline.confusion_threshold, -0.5);
        assert_eq!(parsed.pipeline.buffer_seconds, 5.0);
        assert_eq!(parsed.query.sampling, SamplingSettings::default());
        assert_eq!(parsed.query.candidate_policy, CandidatePolicy::First);
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let parsed: Settings = toml::from_str(
            r#"
            [pipeline]
            max_resources = 3

            [query]
            candidate_policy = "longest"
            "#,
        )
        .unwrap();

        assert_eq!(parsed.pipeline.max_resources, 3);
        assert!(parsed.pipeline.isolate_segment_failures);
        assert_eq!(parsed.query.candidate_policy, CandidatePolicy::Longest);
        assert_eq!(parsed.youtube.order, "relevance");
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut settings = Settings::default();
        settings.server.port = 8080;
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.server.port, 8080);
    }

    #[test]
    fn test_parse_candidate_policy() {
        assert_eq!("FIRST".parse::<CandidatePolicy>().unwrap(), CandidatePolicy::First);
        assert_eq!("shortest".parse::<CandidatePolicy>().unwrap(), CandidatePolicy::Shortest);
        assert!("random".parse::<CandidatePolicy>().is_err());
    }

    #[test]
    fn test_cache_layout() {
        let mut settings = Settings::default();
        settings.general.cache_dir = "/tmp/pl".to_string();
        assert_eq!(settings.videos_dir(), PathBuf::from("/tmp/pl/videos"));
        assert_eq!(settings.transcriptions_dir(), PathBuf::from("/tmp/pl/transcriptions"));
    }
}
