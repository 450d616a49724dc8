//! Language-generation stages of the workflow
//!
//! Both generators talk to an [`LlmProvider`] under a deadline and translate provider
//! failures into [`GenerationError`]s the state machine understands.

mod answer_generator;
mod prompts;
mod query_generator;

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;

use crate::config::LlmConfig;
use crate::domain::{GenerationError, LlmProvider, LlmRequest};

pub use answer_generator::AnswerGenerator;
pub use query_generator::{clean_sql, QueryGenerator};

/// Model parameters shared by the generators
#[derive(Debug, Clone)]
pub struct GenerationSettings {
    pub model: String,
    pub temperature: f32,
    pub timeout: Duration,
}

impl GenerationSettings {
    pub fn from_config(config: &LlmConfig) -> Self {
        Self {
            model: config.model.clone(),
            temperature: config.temperature,
            timeout: config.timeout(),
        }
    }
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self::from_config(&LlmConfig::default())
    }
}

/// One bounded provider call returning the raw completion text
async fn complete(
    provider: &Arc<dyn LlmProvider>,
    settings: &GenerationSettings,
    request: LlmRequest,
) -> Result<String, GenerationError> {
    match timeout(settings.timeout, provider.chat(&settings.model, request)).await {
        Ok(Ok(response)) => Ok(response.content().to_string()),
        Ok(Err(e)) => Err(GenerationError::unavailable(e.to_string())),
        Err(_) => Err(GenerationError::Timeout(settings.timeout.as_millis() as u64)),
    }
}
