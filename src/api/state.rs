//! Shared handler state

use std::sync::Arc;

use crate::domain::{ConversationStore, QueryExecutor};
use crate::infrastructure::database::PhoneCatalog;
use crate::infrastructure::workflow::WorkflowEngine;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<WorkflowEngine>,
    /// Same executor the engine runs queries through; used for readiness
    pub executor: Arc<dyn QueryExecutor>,
    /// Parameterized lookups, absent when no database is configured
    pub catalog: Option<PhoneCatalog>,
}

impl AppState {
    pub fn new(engine: Arc<WorkflowEngine>, executor: Arc<dyn QueryExecutor>) -> Self {
        Self {
            engine,
            executor,
            catalog: None,
        }
    }

    pub fn with_catalog(mut self, catalog: PhoneCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn store(&self) -> &Arc<dyn ConversationStore> {
        self.engine.store()
    }
}
