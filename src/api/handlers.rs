use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use super::error::ApiError;
use crate::models::*;
use crate::storage::{NoteStore, SharedStore, StorageResult};

type ApiResult<T> = Result<T, ApiError>;

/// Run a store call off the async executor. File I/O and the store lock both
/// block, so they go to the blocking pool.
async fn with_store<T, F>(store: SharedStore, f: F) -> ApiResult<T>
where
    T: Send + 'static,
    F: FnOnce(&dyn NoteStore) -> StorageResult<T> + Send + 'static,
{
    let result = tokio::task::spawn_blocking(move || f(store.as_ref())).await?;
    result.map_err(ApiError::from)
}

fn require_id(id: String) -> ApiResult<String> {
    if id.is_empty() {
        return Err(ApiError::BadRequest("id cannot be empty".to_string()));
    }
    Ok(id)
}

fn require_input(payload: Result<Json<NoteInput>, JsonRejection>) -> ApiResult<NoteInput> {
    let Json(input) = payload?;
    input
        .validate()
        .map_err(|reason| ApiError::BadRequest(reason.to_string()))?;
    Ok(input)
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Notes
// ============================================================

pub async fn list_notes(State(store): State<SharedStore>) -> ApiResult<Json<Vec<Note>>> {
    with_store(store, |s| s.get_all()).await.map(Json)
}

pub async fn get_note(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
) -> ApiResult<Json<Note>> {
    let id = require_id(id)?;
    with_store(store, move |s| s.get_by_id(&id)).await.map(Json)
}

pub async fn create_note(
    State(store): State<SharedStore>,
    payload: Result<Json<NoteInput>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Note>)> {
    let input = require_input(payload)?;
    let note = with_store(store, move |s| s.create(input)).await?;
    tracing::info!(id = %note.id, "created note");
    Ok((StatusCode::CREATED, Json(note)))
}

pub async fn update_note(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
    payload: Result<Json<NoteInput>, JsonRejection>,
) -> ApiResult<Json<Note>> {
    let id = require_id(id)?;
    let input = require_input(payload)?;
    with_store(store, move |s| s.update(&id, input))
        .await
        .map(Json)
}

pub async fn delete_note(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = require_id(id)?;
    with_store(store, move |s| s.delete(&id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
