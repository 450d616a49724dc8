//! Infrastructure layer - Adapters for the language model, PostgreSQL and observability

pub mod conversation;
pub mod database;
pub mod generation;
pub mod llm;
pub mod logging;
pub mod observability;
pub mod workflow;
