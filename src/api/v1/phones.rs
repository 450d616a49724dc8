//! Catalogue lookups under `/v1/phones` and `/v1/stats`

use axum::extract::{Path, State};

use crate::api::state::AppState;
use crate::api::types::{ApiError, Json, PhonesResponse, SearchRequest, MAX_SEARCH_LIMIT};
use crate::domain::Row;
use crate::infrastructure::database::{CatalogStats, PhoneCatalog};

fn catalog(state: &AppState) -> Result<&PhoneCatalog, ApiError> {
    state.catalog.as_ref().ok_or_else(ApiError::no_database)
}

pub async fn search_phones(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<PhonesResponse>, ApiError> {
    if !(1..=MAX_SEARCH_LIMIT).contains(&request.limit) {
        return Err(ApiError::bad_request(format!(
            "limit must be between 1 and {}",
            MAX_SEARCH_LIMIT
        )));
    }

    let query = request.query.trim();
    if query.is_empty() {
        return Err(ApiError::bad_request("query cannot be empty"));
    }

    let phones = catalog(&state)?.search(query, request.limit).await?;
    Ok(Json(phones.into()))
}

pub async fn popular_phones(State(state): State<AppState>) -> Result<Json<PhonesResponse>, ApiError> {
    let phones = catalog(&state)?.popular().await?;
    Ok(Json(phones.into()))
}

pub async fn get_phone(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Row>, ApiError> {
    catalog(&state)?
        .find(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("Phone {} not found", id)))
}

pub async fn stats(State(state): State<AppState>) -> Result<Json<CatalogStats>, ApiError> {
    let stats = catalog(&state)?.stats().await?;
    Ok(Json(stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::state_with;
    use crate::domain::llm::MockLlmProvider;
    use crate::domain::query::MockQueryExecutor;
    use axum::http::StatusCode;

    fn state() -> AppState {
        state_with(MockLlmProvider::new("mock"), MockQueryExecutor::new())
    }

    fn search(query: &str, limit: i64) -> Json<SearchRequest> {
        Json(SearchRequest {
            query: query.to_string(),
            limit,
        })
    }

    #[tokio::test]
    async fn test_catalogue_unavailable_without_database() {
        let err = popular_phones(State(state())).await.unwrap_err();
        assert_eq!(err.status, StatusCode::SERVICE_UNAVAILABLE);

        let err = stats(State(state())).await.unwrap_err();
        assert_eq!(err.status, StatusCode::SERVICE_UNAVAILABLE);

        let err = get_phone(State(state()), Path(1)).await.unwrap_err();
        assert_eq!(err.status, StatusCode::SERVICE_UNAVAILABLE);

        let err = search_phones(State(state()), search("galaxy", 10)).await.unwrap_err();
        assert_eq!(err.status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_search_limit_bounds() {
        for limit in [0, 51, -3] {
            let err = search_phones(State(state()), search("galaxy", limit)).await.unwrap_err();
            assert_eq!(err.status, StatusCode::BAD_REQUEST);
        }
    }

    #[tokio::test]
    async fn test_search_requires_text() {
        let err = search_phones(State(state()), search("  ", 5)).await.unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }
}
