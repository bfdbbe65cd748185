use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, patch, post};
use axum::{Json, Router};
use dictionary::{DictionarySource, Lookup, LookupError, LookupOutcome, ModelBackend};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::storage::{EntryPatch, NewEntry, NewTag, StoreError, VocabularyStore};

pub type SharedLookup = Lookup<Arc<dyn DictionarySource>, Arc<dyn ModelBackend>>;

#[derive(Clone)]
pub struct AppState {
    pub lookup: Arc<SharedLookup>,
    /// `None` when no database is configured.
    pub store: Option<Arc<dyn VocabularyStore>>,
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    query: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn not_found(what: &str, id: i64) -> Self {
        Self::new(StatusCode::NOT_FOUND, format!("{what} {id} does not exist"))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { error: self.message })).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        error!(error = %err, "storage operation failed");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}

impl From<LookupError> for ApiError {
    fn from(err: LookupError) -> Self {
        let status = match err {
            LookupError::EmptyQuery => StatusCode::BAD_REQUEST,
            LookupError::MalformedModelOutput(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/search", post(search))
        .route(
            "/api/vocabulary",
            get(list_entries).put(replace_entries).post(insert_entry),
        )
        .route(
            "/api/vocabulary/:id",
            patch(update_entry).delete(delete_entry),
        )
        .route("/api/tags", get(list_tags).put(replace_tags).post(insert_tag))
        .route("/api/tags/:id", delete(delete_tag))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// A missing or unreadable body counts as an empty query.
async fn search(
    State(state): State<AppState>,
    request: Option<Json<SearchRequest>>,
) -> Result<Response, ApiError> {
    let query = request
        .map(|Json(request)| request.query)
        .unwrap_or_default();
    let response = match state.lookup.lookup(&query).await? {
        LookupOutcome::DictionaryHit(result) => Json(result).into_response(),
        LookupOutcome::ModelHit(value) => Json(value).into_response(),
        LookupOutcome::ModelRawFallback(raw) => Json(raw).into_response(),
        LookupOutcome::ModelUnavailable(message) | LookupOutcome::ModelError(message) => {
            Json(ErrorBody { error: message }).into_response()
        }
    };
    Ok(response)
}

fn store(state: &AppState) -> Result<&dyn VocabularyStore, ApiError> {
    state.store.as_deref().ok_or_else(|| {
        ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "storage is not configured",
        )
    })
}

async fn list_entries(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(store(&state)?.list_entries().await?))
}

async fn replace_entries(
    State(state): State<AppState>,
    payload: Result<Json<Vec<NewEntry>>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(entries) = payload?;
    Ok(Json(store(&state)?.replace_entries(entries).await?))
}

async fn insert_entry(
    State(state): State<AppState>,
    payload: Result<Json<NewEntry>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(entry) = payload?;
    let entry = store(&state)?.insert_entry(entry).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn update_entry(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<EntryPatch>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(patch) = payload?;
    store(&state)?
        .update_entry(id, patch)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("entry", id))
}

async fn delete_entry(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if store(&state)?.delete_entry(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("entry", id))
    }
}

async fn list_tags(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(store(&state)?.list_tags().await?))
}

async fn replace_tags(
    State(state): State<AppState>,
    payload: Result<Json<Vec<NewTag>>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(tags) = payload?;
    Ok(Json(store(&state)?.replace_tags(tags).await?))
}

async fn insert_tag(
    State(state): State<AppState>,
    payload: Result<Json<NewTag>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(tag) = payload?;
    let tag = store(&state)?.insert_tag(tag).await?;
    Ok((StatusCode::CREATED, Json(tag)))
}

async fn delete_tag(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if store(&state)?.delete_tag(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("tag", id))
    }
}
