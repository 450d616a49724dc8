//! Request/response bodies of the HTTP API

pub mod error;
pub mod json;

use serde::{Deserialize, Serialize};

use crate::domain::{ThreadId, Turn};

pub use error::{ApiError, ApiErrorResponse};
pub use json::Json;

/// Body of `POST /v1/ask`
#[derive(Debug, Clone, Deserialize)]
pub struct AskRequest {
    pub question: String,
    #[serde(default)]
    pub thread_id: Option<String>,
}

/// Body of `GET /v1/threads/{thread_id}`
#[derive(Debug, Clone, Serialize)]
pub struct ThreadResponse {
    pub thread_id: ThreadId,
    pub turns: Vec<Turn>,
}

/// Body of `POST /v1/phones/search`
#[derive(Debug, Clone, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default = "default_search_limit")]
    pub limit: i64,
}

pub const MAX_SEARCH_LIMIT: i64 = 50;

fn default_search_limit() -> i64 {
    10
}

#[derive(Debug, Clone, Serialize)]
pub struct PhonesResponse {
    pub phones: Vec<crate::domain::Row>,
    pub count: usize,
}

impl From<Vec<crate::domain::Row>> for PhonesResponse {
    fn from(phones: Vec<crate::domain::Row>) -> Self {
        Self {
            count: phones.len(),
            phones,
        }
    }
}
