//! Note endpoints. Notes can be created, read and deleted, never edited.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;

use medtrack_core::{Note, NoteInput};

use crate::error::ApiError;
use crate::state::AppState;

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Note>>, ApiError> {
    Ok(Json(state.read_store()?.notes()))
}

pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<NoteInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Note>), ApiError> {
    let Json(input) = payload?;
    let draft = input.validate(Utc::now().date_naive())?;
    let note = state.write_store()?.create_note(draft)?;
    Ok((StatusCode::CREATED, Json(note)))
}

pub async fn retrieve(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Note>, ApiError> {
    Ok(Json(state.read_store()?.note(id)?))
}

pub async fn destroy(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<StatusCode, ApiError> {
    state.write_store()?.delete_note(id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// `PUT`/`PATCH /notes/{id}`: refused whether or not the note exists
pub async fn reject_update() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, "GET, DELETE")],
    )
}
