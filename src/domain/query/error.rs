//! Generation and execution error types

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure of the language-generation service to produce usable text
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GenerationError {
    #[error("Question is empty")]
    EmptyQuestion,

    #[error("Generation service unavailable: {0}")]
    Unavailable(String),

    #[error("Generation service timed out after {0}ms")]
    Timeout(u64),

    #[error("Generation service returned no usable text")]
    EmptyOutput,
}

impl GenerationError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    /// Whether another attempt could succeed with the same input
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::EmptyQuestion)
    }
}

/// Category of a store-side failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionErrorKind {
    Connection,
    Timeout,
    Constraint,
    Unknown,
}

impl ExecutionErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connection => "connection",
            Self::Timeout => "timeout",
            Self::Constraint => "constraint",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ExecutionErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure reported by the query executor
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{kind} error: {message}")]
pub struct ExecutionError {
    pub kind: ExecutionErrorKind,
    pub message: String,
}

impl ExecutionError {
    pub fn new(kind: ExecutionErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn connection(message: impl Into<String>) -> Self {
        Self::new(ExecutionErrorKind::Connection, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ExecutionErrorKind::Timeout, message)
    }

    pub fn constraint(message: impl Into<String>) -> Self {
        Self::new(ExecutionErrorKind::Constraint, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ExecutionErrorKind::Unknown, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_error_display() {
        assert_eq!(
            GenerationError::Timeout(30000).to_string(),
            "Generation service timed out after 30000ms"
        );
        assert_eq!(
            GenerationError::unavailable("connection refused").to_string(),
            "Generation service unavailable: connection refused"
        );
    }

    #[test]
    fn test_empty_question_is_not_retryable() {
        assert!(!GenerationError::EmptyQuestion.is_retryable());
        assert!(GenerationError::EmptyOutput.is_retryable());
        assert!(GenerationError::Timeout(1).is_retryable());
    }

    #[test]
    fn test_execution_error_display() {
        let err = ExecutionError::timeout("statement timeout after 10000ms");
        assert_eq!(err.kind, ExecutionErrorKind::Timeout);
        assert_eq!(err.to_string(), "timeout error: statement timeout after 10000ms");
    }

    #[test]
    fn test_kind_serialization() {
        let json = serde_json::to_string(&ExecutionErrorKind::Constraint).unwrap();
        assert_eq!(json, "\"constraint\"");
    }
}
