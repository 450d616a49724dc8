//! Workflow engine

mod engine;

pub use engine::{AskHandle, WorkflowEngine, DEFAULT_HISTORY_TURNS};
