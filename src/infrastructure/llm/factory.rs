use std::sync::Arc;

use super::http_client::HttpClient;
use super::OpenAiProvider;
use crate::config::LlmConfig;
use crate::domain::{DomainError, LlmProvider};

/// Supported provider kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProviderType {
    /// OpenAI or any service speaking its chat-completions API
    OpenAi,
}

impl LlmProviderType {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "openai" | "open_ai" | "openai-compatible" | "openai_compatible" => Some(Self::OpenAi),
            _ => None,
        }
    }
}

/// Factory for creating LLM providers
#[derive(Debug)]
pub struct LlmProviderFactory;

impl LlmProviderFactory {
    /// Build the configured provider, reading the API key from the environment
    pub fn from_config(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, DomainError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                DomainError::configuration(format!(
                    "Environment variable {} is not set",
                    config.api_key_env
                ))
            })?;

        Self::create(config, api_key)
    }

    /// Build the configured provider with an explicit API key
    pub fn create(
        config: &LlmConfig,
        api_key: impl Into<String>,
    ) -> Result<Arc<dyn LlmProvider>, DomainError> {
        let provider_type = LlmProviderType::from_str(&config.provider).ok_or_else(|| {
            DomainError::configuration(format!("Unsupported LLM provider: {}", config.provider))
        })?;

        // The generators enforce their own deadline; this one only catches a hung socket.
        let http_client = HttpClient::with_timeout(config.timeout() * 2)?;

        match provider_type {
            LlmProviderType::OpenAi => {
                let provider = match &config.base_url {
                    Some(base_url) => OpenAiProvider::with_base_url(http_client, api_key, base_url),
                    None => OpenAiProvider::new(http_client, api_key),
                };
                Ok(Arc::new(provider))
            }
        }
    }
}
