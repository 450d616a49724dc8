//! Caller-facing result of one `ask`

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::conversation::{ThreadId, Turn, TurnStatus};
use crate::domain::query::Row;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AskResponse {
    pub answer: String,
    pub query: Option<String>,
    pub rows: Option<Vec<Row>>,
    pub status: TurnStatus,
    pub thread_id: ThreadId,
    pub timestamp: DateTime<Utc>,
}

impl AskResponse {
    pub fn from_turn(thread_id: ThreadId, turn: &Turn) -> Self {
        Self {
            answer: turn.answer().to_string(),
            query: turn.query().map(str::to_string),
            rows: turn.rows().map(<[Row]>::to_vec),
            status: turn.status(),
            thread_id,
            timestamp: turn.created_at(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status.is_ok()
    }
}
