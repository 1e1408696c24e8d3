//! OpenAI client configuration with sensible defaults.

use crate::error::{PersonaLearnError, Result};
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Default timeout for OpenAI API requests (5 minutes).
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Create an OpenAI client with configured timeout.
pub fn create_client() -> Result<Client<OpenAIConfig>> {
    create_client_with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
}

/// Create an OpenAI client with a custom timeout.
pub fn create_client_with_timeout(timeout: Duration) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder().timeout(timeout).build()?;

    Ok(Client::with_config(OpenAIConfig::default()).with_http_client(http_client))
}

/// Check whether an OpenAI API key is present in the environment.
pub fn is_api_key_configured() -> bool {
    std::env::var("OPENAI_API_KEY").is_ok_and(|key| !key.is_empty())
}

/// Fail early with a readable message when no API key is configured.
pub fn require_api_key() -> Result<()> {
    if is_api_key_configured() {
        Ok(())
    } else {
        Err(PersonaLearnError::Config(
            "OPENAI_API_KEY not set. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        ))
    }
}
