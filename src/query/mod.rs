//! Search query derivation from transcript excerpts.
//!
//! A [`QueryDeriver`] renders the query prompt for an excerpt, asks a
//! [`TextGenerator`] for candidate completions and picks one according to its
//! [`CandidatePolicy`].

mod openai;

pub use crate::config::CandidatePolicy;
pub use openai::OpenAICompletionGenerator;

use crate::config::{Prompts, Settings};
use crate::error::{PersonaLearnError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, instrument};

/// Trait for text completion services.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Complete `prompt`, returning candidates in the order the service ranked them.
    async fn generate(&self, prompt: &str) -> Result<Vec<String>>;
}

/// Turns confusing transcript excerpts into search queries.
pub struct QueryDeriver {
    generator: Arc<dyn TextGenerator>,
    template_path: Option<PathBuf>,
    template: OnceCell<String>,
    policy: CandidatePolicy,
}

impl QueryDeriver {
    /// Create a deriver. Without a template path the built-in prompt is used.
    pub fn new(generator: Arc<dyn TextGenerator>, template_path: Option<PathBuf>) -> Self {
        Self {
            generator,
            template_path,
            template: OnceCell::new(),
            policy: CandidatePolicy::default(),
        }
    }

    /// Create the production deriver (OpenAI completions) from settings.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let generator = OpenAICompletionGenerator::from_settings(&settings.query)?;
        Ok(Self::new(Arc::new(generator), settings.template_path())
            .with_policy(settings.query.candidate_policy))
    }

    /// Override the candidate selection policy.
    pub fn with_policy(mut self, policy: CandidatePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The prompt template, read on first use and kept for the deriver's lifetime.
    async fn template(&self) -> Result<&str> {
        let template = self
            .template
            .get_or_try_init(|| async {
                match &self.template_path {
                    Some(path) => {
                        debug!("Loading query template from {}", path.display());
                        Prompts::read_template(path).map_err(|e| {
                            PersonaLearnError::Config(format!(
                                "Cannot read query template {}: {}",
                                path.display(),
                                e
                            ))
                        })
                    }
                    None => Ok(Prompts::default().query.template),
                }
            })
            .await?;

        Ok(template.as_str())
    }

    /// Build the prompt for an excerpt.
    pub async fn prompt_for(&self, video_title: &str, excerpt: &str) -> Result<String> {
        let mut vars = HashMap::new();
        vars.insert("video_title".to_string(), video_title.to_string());
        vars.insert("transcript".to_string(), excerpt.to_string());

        Ok(Prompts::render(self.template().await?, &vars))
    }

    /// All usable candidate queries for an excerpt, in generation order.
    #[instrument(skip(self, excerpt), fields(excerpt_len = excerpt.len()))]
    pub async fn derive_queries(&self, video_title: &str, excerpt: &str) -> Result<Vec<String>> {
        let prompt = self.prompt_for(video_title, excerpt).await?;

        let candidates: Vec<String> = self
            .generator
            .generate(&prompt)
            .await
            .map_err(|e| PersonaLearnError::QueryDerivation(e.to_string()))?
            .into_iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();

        if candidates.is_empty() {
            return Err(PersonaLearnError::QueryDerivation(
                "generator returned no usable candidates".to_string(),
            ));
        }

        debug!("Generated {} candidate queries", candidates.len());
        Ok(candidates)
    }

    /// The single query chosen by the deriver's policy.
    pub async fn derive_query(&self, video_title: &str, excerpt: &str) -> Result<String> {
        let candidates = self.derive_queries(video_title, excerpt).await?;
        select_candidate(self.policy, candidates).ok_or_else(|| {
            PersonaLearnError::QueryDerivation("no candidate selected".to_string())
        })
    }
}

/// Pick one candidate. Ties keep the earliest candidate.
pub fn select_candidate(policy: CandidatePolicy, candidates: Vec<String>) -> Option<String> {
    let mut iter = candidates.into_iter();
    match policy {
        CandidatePolicy::First => iter.next(),
        CandidatePolicy::Shortest => {
            iter.reduce(|best, c| if c.len() < best.len() { c } else { best })
        }
        CandidatePolicy::Longest => {
            iter.reduce(|best, c| if c.len() > best.len() { c } else { best })
        }
    }
}
