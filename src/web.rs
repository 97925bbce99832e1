//! HTTP API surface.
//!
//! # Endpoints
//!
//! - `GET /api/health` — Health check.
//! - `GET /api/lookup?word=` — Looks up a word, serving it from the cache
//!   or fetching, enriching, and storing it. 404 when the dictionary has
//!   no entry.
//! - `GET /api/words` — Lists stored words, newest first. Accepts `skip`
//!   and `limit` query parameters.
//! - `GET /api/words/:id` — Fetches one stored word by id.
//! - `DELETE /api/words/:id` — Deletes a stored word by id. 204 on
//!   success, 404 when the id does not exist.

use crate::dictionary::HttpDictionary;
use crate::error::ApiError;
use crate::lookup::lookup;
use crate::store::Store;
use crate::translate::HttpTranslator;
use crate::word::StoredWord;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Shared state for the API server, accessible by all route handlers.
pub struct AppState {
    /// Bounded persistent word store.
    pub store: Store,

    /// External dictionary client.
    pub dictionary: HttpDictionary,

    /// Translation service client.
    pub translator: HttpTranslator,
}

/// Response from the `/api/health` endpoint.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

/// Query parameters for the `/api/lookup` endpoint.
#[derive(Deserialize)]
struct LookupParams {
    word: String,
}

/// Query parameters for the `/api/words` endpoint.
#[derive(Deserialize)]
struct ListParams {
    #[serde(default)]
    skip: i64,
    #[serde(default = "default_limit")]
    limit: i64,
}

fn default_limit() -> i64 {
    100
}

/// Builds the API router.
///
/// CORS is wide open: the service fronts a browser UI served from a
/// different origin.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health))
        .route("/api/lookup", get(lookup_word))
        .route("/api/words", get(list_words))
        .route("/api/words/:id", get(get_word).delete(delete_word))
        .layer(cors)
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "healthy" })
}

/// Looks a word up, from the cache or from the external dictionary.
async fn lookup_word(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LookupParams>,
) -> Result<Json<StoredWord>, ApiError> {
    let stored = lookup(
        &state.store,
        &state.dictionary,
        &state.translator,
        &params.word,
    )
    .await?;

    Ok(Json(stored))
}

/// Lists stored words, newest first.
async fn list_words(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<StoredWord>>, ApiError> {
    let words = state.store.list(params.skip, params.limit)?;
    Ok(Json(words))
}

/// Fetches one stored word by id.
async fn get_word(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<StoredWord>, ApiError> {
    let stored = state
        .store
        .get(id)?
        .ok_or_else(|| ApiError::NotFound("Word not found".to_string()))?;

    Ok(Json(stored))
}

/// Deletes a stored word by id.
async fn delete_word(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.store.delete(id)?;
    Ok(StatusCode::NO_CONTENT)
}
