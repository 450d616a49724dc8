//! Phone advisor
//!
//! Answers natural-language questions about phone specifications. Each question is
//! turned into SQL by a language model, checked by a read-only validator, executed
//! against the scraped phone catalogue and summarized, with per-thread memory so
//! follow-up questions keep their context.

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use anyhow::Context;
use sqlx::PgPool;
use tracing::{info, warn};

use api::AppState;
use config::ConversationBackend;
use domain::{ConversationStore, FewShotExamples, QueryExecutor, QueryValidator, SchemaDescriptor};
use infrastructure::conversation::{InMemoryConversationStore, PostgresConversationStore};
use infrastructure::database::{
    connect_pool, DisconnectedExecutor, PhoneCatalog, PostgresQueryExecutor,
};
use infrastructure::generation::{AnswerGenerator, GenerationSettings, QueryGenerator};
use infrastructure::llm::LlmProviderFactory;
use infrastructure::workflow::WorkflowEngine;

/// Schema descriptor from `schema.path`, or the built-in phone schema
pub fn load_schema(config: &AppConfig) -> anyhow::Result<SchemaDescriptor> {
    match &config.schema.path {
        Some(path) => {
            let schema = SchemaDescriptor::from_file(path)?;
            info!(relation = %schema.relation(), path = %path.display(), "Loaded schema descriptor");
            Ok(schema)
        }
        None => Ok(SchemaDescriptor::phones()),
    }
}

/// Connection pool when a database URL is configured
pub async fn connect_database(config: &AppConfig) -> anyhow::Result<Option<PgPool>> {
    if config.database.resolved_url().is_none() {
        warn!("No database configured; questions will fail at execution and catalogue endpoints return 503");
        return Ok(None);
    }

    Ok(Some(connect_pool(&config.database).await?))
}

async fn create_store(
    config: &AppConfig,
    pool: Option<&PgPool>,
) -> anyhow::Result<Arc<dyn ConversationStore>> {
    match config.conversation.backend {
        ConversationBackend::Memory => Ok(Arc::new(InMemoryConversationStore::new())),
        ConversationBackend::Postgres => {
            let pool = pool.context("conversation.backend = \"postgres\" requires a database")?;
            let store = PostgresConversationStore::new(pool.clone());
            store.ensure_schema().await?;
            Ok(Arc::new(store))
        }
    }
}

/// Build the workflow engine and the handler state from configuration
pub async fn create_app_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let schema = Arc::new(load_schema(config)?);
    let examples = Arc::new(FewShotExamples::load_or_builtin(&config.workflow.few_shot_path)?);
    let provider = LlmProviderFactory::from_config(&config.llm)?;
    let pool = connect_database(config).await?;

    let executor: Arc<dyn QueryExecutor> = match &pool {
        Some(pool) => Arc::new(PostgresQueryExecutor::new(
            pool.clone(),
            config.workflow.query_timeout(),
        )),
        None => Arc::new(DisconnectedExecutor),
    };

    let store = create_store(config, pool.as_ref()).await?;
    let settings = GenerationSettings::from_config(&config.llm);

    let engine = WorkflowEngine::new(
        QueryGenerator::new(provider.clone(), settings.clone(), schema.clone(), examples),
        QueryValidator::new(config.workflow.validator_config()),
        executor.clone(),
        AnswerGenerator::new(provider, settings),
        store,
    )
    .with_budget(config.workflow.retry_budget())
    .with_history_turns(config.workflow.history_turns);

    info!(
        relation = %schema.relation(),
        model = %config.llm.model,
        backend = ?config.conversation.backend,
        "Workflow engine ready"
    );

    let state = AppState::new(Arc::new(engine), executor);

    Ok(match pool {
        Some(pool) => state.with_catalog(PhoneCatalog::new(pool, schema.relation())),
        None => state,
    })
}
