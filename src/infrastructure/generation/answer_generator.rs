use std::sync::Arc;

use tracing::debug;

use super::prompts::{answer_prompt, ANSWER_SYSTEM_PROMPT};
use super::{complete, GenerationSettings};
use crate::domain::workflow::NO_MATCH_ANSWER;
use crate::domain::{GenerationError, LlmProvider, LlmRequest, QueryResult, ValidatedQuery};

/// Turns result rows into a natural-language answer
#[derive(Debug, Clone)]
pub struct AnswerGenerator {
    provider: Arc<dyn LlmProvider>,
    settings: GenerationSettings,
}

impl AnswerGenerator {
    pub fn new(provider: Arc<dyn LlmProvider>, settings: GenerationSettings) -> Self {
        Self { provider, settings }
    }

    /// Answer `question` from `result`
    ///
    /// With `no_match` set the provider is never called and the fixed no-match answer is
    /// returned, so nothing is invented for an empty result.
    pub async fn generate(
        &self,
        question: &str,
        query: &ValidatedQuery,
        result: &QueryResult,
        no_match: bool,
    ) -> Result<String, GenerationError> {
        if no_match {
            debug!("No matching rows, using the no-match answer");
            return Ok(NO_MATCH_ANSWER.to_string());
        }

        let request = LlmRequest::builder()
            .system(ANSWER_SYSTEM_PROMPT)
            .user(answer_prompt(question, query.sql(), &result.rows))
            .temperature(self.settings.temperature)
            .build();

        let answer = complete(&self.provider, &self.settings, request).await?;
        let answer = answer.trim();

        if answer.is_empty() {
            return Err(GenerationError::EmptyOutput);
        }

        Ok(answer.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::llm::MockLlmProvider;
    use serde_json::json;

    fn query() -> ValidatedQuery {
        ValidatedQuery::for_tests("SELECT name FROM samsung_phones LIMIT 5", 5)
    }

    fn result(names: &[&str]) -> QueryResult {
        QueryResult::new(
            names
                .iter()
                .map(|n| json!({ "name": n }).as_object().cloned().unwrap())
                .collect(),
        )
    }

    #[tokio::test]
    async fn test_answer_from_rows() {
        let provider = Arc::new(MockLlmProvider::new("mock").with_response("  The S25 and S24.  "));
        let generator = AnswerGenerator::new(provider.clone(), GenerationSettings::default());

        let answer = generator
            .generate("Which phones?", &query(), &result(&["Galaxy S25", "Galaxy S24"]), false)
            .await
            .unwrap();

        assert_eq!(answer, "The S25 and S24.");
        let prompt = provider.requests()[0].last_user_content().unwrap().to_string();
        assert!(prompt.contains("Galaxy S24"));
    }

    #[tokio::test]
    async fn test_no_match_does_not_call_provider() {
        let provider = Arc::new(MockLlmProvider::new("mock").with_response("made up phones"));
        let generator = AnswerGenerator::new(provider.clone(), GenerationSettings::default());

        let answer = generator
            .generate("q", &query(), &QueryResult::empty(), true)
            .await
            .unwrap();

        assert_eq!(answer, NO_MATCH_ANSWER);
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_no_match_flag_decides_not_the_rows() {
        let provider = Arc::new(MockLlmProvider::new("mock").with_response("The S25."));
        let generator = AnswerGenerator::new(provider.clone(), GenerationSettings::default());

        let answer = generator
            .generate("q", &query(), &result(&["Galaxy S25"]), true)
            .await
            .unwrap();

        assert_eq!(answer, NO_MATCH_ANSWER);
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_provider_failure_surfaces() {
        let provider = Arc::new(MockLlmProvider::new("mock").with_error("boom"));
        let generator = AnswerGenerator::new(provider, GenerationSettings::default());

        let result = generator.generate("q", &query(), &result(&["a"]), false).await;
        assert!(matches!(result, Err(GenerationError::Unavailable(_))));
    }
}
