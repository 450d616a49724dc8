use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use super::prompts::{query_prompt, QUERY_SYSTEM_PROMPT};
use super::{complete, GenerationSettings};
use crate::domain::schema::{FewShotExamples, SchemaDescriptor};
use crate::domain::workflow::Rejection;
use crate::domain::{GenerationError, LlmProvider, LlmRequest, Turn};

static CODE_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)```[a-z]*").unwrap());

static LABEL_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^sql(?:\s+query)?\s*:\s*").unwrap());

/// Strip markdown fences, labels and trailing semicolons from a completion
pub fn clean_sql(raw: &str) -> String {
    let without_fences = CODE_FENCE.replace_all(raw, "");
    let trimmed = without_fences.trim();
    let unlabeled = LABEL_PREFIX.replace(trimmed, "");

    unlabeled.trim().trim_end_matches(';').trim_end().to_string()
}

/// Turns a question into a candidate query
#[derive(Debug, Clone)]
pub struct QueryGenerator {
    provider: Arc<dyn LlmProvider>,
    settings: GenerationSettings,
    schema: Arc<SchemaDescriptor>,
    examples: Arc<FewShotExamples>,
}

impl QueryGenerator {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        settings: GenerationSettings,
        schema: Arc<SchemaDescriptor>,
        examples: Arc<FewShotExamples>,
    ) -> Self {
        Self {
            provider,
            settings,
            schema,
            examples,
        }
    }

    pub fn schema(&self) -> &SchemaDescriptor {
        &self.schema
    }

    /// Ask the provider for a candidate; `history` is prior turns, `feedback` a rejected attempt
    pub async fn generate(
        &self,
        question: &str,
        history: &[Turn],
        feedback: Option<&Rejection>,
    ) -> Result<String, GenerationError> {
        if question.trim().is_empty() {
            return Err(GenerationError::EmptyQuestion);
        }

        let prompt = query_prompt(&self.schema, &self.examples, question, history, feedback);
        let request = LlmRequest::builder()
            .system(QUERY_SYSTEM_PROMPT)
            .user(prompt)
            .temperature(self.settings.temperature)
            .build();

        let raw = complete(&self.provider, &self.settings, request).await?;
        let candidate = clean_sql(&raw);

        if candidate.is_empty() {
            return Err(GenerationError::EmptyOutput);
        }

        debug!(candidate = %candidate, "Generated candidate query");
        Ok(candidate)
    }
}
