//! Versioned JSON API

pub mod ask;
pub mod phones;
pub mod threads;

use axum::{
    routing::{get, post},
    Router,
};

use super::state::AppState;

pub fn create_v1_router() -> Router<AppState> {
    Router::new()
        .route("/ask", post(ask::ask))
        .route("/threads/{thread_id}", get(threads::get_thread))
        .route("/phones/search", post(phones::search_phones))
        .route("/phones/popular", get(phones::popular_phones))
        .route("/phones/{id}", get(phones::get_phone))
        .route("/stats", get(phones::stats))
}
