//! `GET /v1/threads/{thread_id}`

use axum::extract::{Path, State};

use crate::api::state::AppState;
use crate::api::types::{ApiError, Json, ThreadResponse};
use crate::domain::ThreadId;

/// Full turn history; unknown threads return an empty list
pub async fn get_thread(
    State(state): State<AppState>,
    Path(thread_id): Path<String>,
) -> Result<Json<ThreadResponse>, ApiError> {
    let thread_id = ThreadId::new(thread_id)?;
    let turns = state.engine.history(&thread_id).await?;

    Ok(Json(ThreadResponse { thread_id, turns }))
}
