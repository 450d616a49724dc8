//! Workflow error types

use thiserror::Error;

/// Errors raised by the workflow machinery itself (never by a turn's stages)
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("Event '{event}' is not valid in state '{state}'")]
    InvalidTransition {
        state: &'static str,
        event: &'static str,
    },

    #[error("Workflow run was cancelled")]
    Cancelled,

    #[error("Workflow task failed: {0}")]
    TaskFailed(String),
}

impl WorkflowError {
    pub fn invalid_transition(state: &'static str, event: &'static str) -> Self {
        Self::InvalidTransition { state, event }
    }

    pub fn task_failed(message: impl Into<String>) -> Self {
        Self::TaskFailed(message.into())
    }
}
