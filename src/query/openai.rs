//! OpenAI completions-based text generation.

use super::TextGenerator;
use crate::config::{QuerySettings, SamplingSettings};
use crate::error::{PersonaLearnError, Result};
use crate::openai::create_client;
use async_openai::types::CreateCompletionRequestArgs;
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Text generator backed by the OpenAI completions endpoint.
pub struct OpenAICompletionGenerator {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    candidates: u8,
    sampling: SamplingSettings,
}

impl OpenAICompletionGenerator {
    /// Create a generator from query settings.
    pub fn from_settings(settings: &QuerySettings) -> Result<Self> {
        Ok(Self {
            client: create_client()?,
            model: settings.model.clone(),
            candidates: settings.candidates.max(1),
            sampling: settings.sampling.clone(),
        })
    }
}

#[async_trait]
impl TextGenerator for OpenAICompletionGenerator {
    #[instrument(skip(self, prompt), fields(model = %self.model, n = self.candidates))]
    async fn generate(&self, prompt: &str) -> Result<Vec<String>> {
        let request = CreateCompletionRequestArgs::default()
            .model(&self.model)
            .prompt(prompt)
            .temperature(self.sampling.temperature)
            .max_tokens(self.sampling.max_tokens)
            .top_p(self.sampling.top_p)
            .frequency_penalty(self.sampling.frequency_penalty)
            .presence_penalty(self.sampling.presence_penalty)
            .n(self.candidates)
            .build()
            .map_err(|e| PersonaLearnError::OpenAI(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .completions()
            .create(request)
            .await
            .map_err(|e| PersonaLearnError::OpenAI(format!("Completion API error: {}", e)))?;

        debug!("Received {} completion choice(s)", response.choices.len());

        let mut choices = response.choices;
        choices.sort_by_key(|c| c.index);
        Ok(choices.into_iter().map(|c| c.text.trim().to_string()).collect())
    }
}
