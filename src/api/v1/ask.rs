//! `POST /v1/ask`

use axum::extract::State;
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::{ApiError, AskRequest, Json};
use crate::domain::{AskResponse, ThreadId};

/// Runs one workflow turn; workflow failures still answer 200 with a failure status
pub async fn ask(
    State(state): State<AppState>,
    Json(request): Json<AskRequest>,
) -> Result<Json<AskResponse>, ApiError> {
    let thread_id = ThreadId::resolve(request.thread_id.as_deref())?;
    debug!(thread_id = %thread_id, "Received question");

    let response = state.engine.ask(&request.question, Some(thread_id)).await;
    Ok(Json(response))
}
