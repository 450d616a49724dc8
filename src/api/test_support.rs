//! Handler test fixtures

use std::sync::Arc;
use std::time::Duration;

use axum::body::to_bytes;
use axum::response::Response;
use serde_json::Value;

use super::state::AppState;
use crate::domain::llm::MockLlmProvider;
use crate::domain::query::MockQueryExecutor;
use crate::domain::{
    FewShotExamples, LlmProvider, QueryExecutor, QueryValidator, SchemaDescriptor, ValidatorConfig,
};
use crate::infrastructure::conversation::InMemoryConversationStore;
use crate::infrastructure::generation::{AnswerGenerator, GenerationSettings, QueryGenerator};
use crate::infrastructure::workflow::WorkflowEngine;

pub fn state_with(provider: MockLlmProvider, executor: MockQueryExecutor) -> AppState {
    let provider: Arc<dyn LlmProvider> = Arc::new(provider);
    let executor: Arc<dyn QueryExecutor> = Arc::new(executor);
    let settings = GenerationSettings {
        model: "test-model".to_string(),
        temperature: 0.0,
        timeout: Duration::from_secs(5),
    };

    let engine = WorkflowEngine::new(
        QueryGenerator::new(
            provider.clone(),
            settings.clone(),
            Arc::new(SchemaDescriptor::phones()),
            Arc::new(FewShotExamples::builtin()),
        ),
        QueryValidator::new(ValidatorConfig::default()),
        executor.clone(),
        AnswerGenerator::new(provider, settings),
        Arc::new(InMemoryConversationStore::new()),
    );

    AppState::new(Arc::new(engine), executor)
}

pub async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
