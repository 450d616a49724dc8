//! One completed question/answer exchange

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::query::Row;

/// Terminal status of a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnStatus {
    Ok,
    GenerationFailed,
    ValidationFailed,
    ExecutionFailed,
}

impl TurnStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::GenerationFailed => "generation_failed",
            Self::ValidationFailed => "validation_failed",
            Self::ExecutionFailed => "execution_failed",
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl fmt::Display for TurnStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stage at which a turn gave up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    Generation,
    Validation,
    Execution,
}

impl FailureReason {
    pub fn status(&self) -> TurnStatus {
        match self {
            Self::Generation => TurnStatus::GenerationFailed,
            Self::Validation => TurnStatus::ValidationFailed,
            Self::Execution => TurnStatus::ExecutionFailed,
        }
    }

    /// Caller-facing explanation recorded in place of a data answer
    pub fn apology(&self) -> &'static str {
        match self {
            Self::Generation => {
                "Sorry, I couldn't turn that question into a database query right now. Please try again or rephrase it."
            }
            Self::Validation => {
                "Sorry, I couldn't build a safe query for that question. Try asking about phone specifications in a different way."
            }
            Self::Execution => {
                "Sorry, something went wrong while looking up the phone data. Please try again in a moment."
            }
        }
    }
}

/// Immutable record appended to a thread once a workflow run finishes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    question: String,
    query: Option<String>,
    rows: Option<Vec<Row>>,
    answer: String,
    status: TurnStatus,
    created_at: DateTime<Utc>,
}

impl Turn {
    /// Successful turn: the executed query, its rows and the answer built from them
    pub fn answered(
        question: impl Into<String>,
        query: impl Into<String>,
        rows: Vec<Row>,
        answer: impl Into<String>,
    ) -> Self {
        Self {
            question: question.into(),
            query: Some(query.into()),
            rows: Some(rows),
            answer: answer.into(),
            status: TurnStatus::Ok,
            created_at: Utc::now(),
        }
    }

    /// Failed turn; `query` is the last candidate, if generation produced one
    pub fn failed(question: impl Into<String>, reason: FailureReason, query: Option<String>) -> Self {
        Self {
            question: question.into(),
            query,
            rows: None,
            answer: reason.apology().to_string(),
            status: reason.status(),
            created_at: Utc::now(),
        }
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn rows(&self) -> Option<&[Row]> {
        self.rows.as_deref()
    }

    pub fn answer(&self) -> &str {
        &self.answer
    }

    pub fn status(&self) -> TurnStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Set the append time; stores call this while holding the thread's append lock
    pub fn stamp(&mut self, at: DateTime<Utc>) {
        self.created_at = at;
    }

    pub fn is_ok(&self) -> bool {
        self.status.is_ok()
    }

    /// Answer shortened for use as prompt context
    pub fn answer_summary(&self, max_chars: usize) -> String {
        if self.answer.chars().count() <= max_chars {
            return self.answer.clone();
        }

        let mut summary: String = self.answer.chars().take(max_chars).collect();
        summary.push_str("...");
        summary
    }
}
