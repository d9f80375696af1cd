//! Dose log endpoints.
//!
//! - `GET/POST /logs`
//! - `GET /logs/filter?start=YYYY-MM-DD&end=YYYY-MM-DD`: inclusive, oldest first
//! - `GET/PUT/PATCH/DELETE /logs/{id}`

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;

use medtrack_core::{DoseLog, DoseLogInput};

use crate::error::ApiError;
use crate::query::DateRangeQuery;
use crate::state::AppState;

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<DoseLog>>, ApiError> {
    Ok(Json(state.read_store()?.logs()))
}

pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<DoseLogInput>, JsonRejection>,
) -> Result<(StatusCode, Json<DoseLog>), ApiError> {
    let Json(input) = payload?;
    let draft = input.validate(Utc::now())?;
    let mut store = state.write_store()?;
    let log = store.create_log(draft)?;
    let medication = store.medication(log.medication)?;
    tracing::info!(id = log.id, "Logged {}", log.describe(&medication.name));
    Ok((StatusCode::CREATED, Json(log)))
}

pub async fn filter(
    State(state): State<AppState>,
    Query(query): Query<DateRangeQuery>,
) -> Result<Json<Vec<DoseLog>>, ApiError> {
    let (start, end) = query.required()?;
    Ok(Json(state.read_store()?.logs_between(start, end)))
}

pub async fn retrieve(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<DoseLog>, ApiError> {
    Ok(Json(state.read_store()?.log(id)?))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    payload: Result<Json<DoseLogInput>, JsonRejection>,
) -> Result<Json<DoseLog>, ApiError> {
    let mut store = state.write_store()?;
    store.log(id)?;
    let Json(input) = payload?;
    let log = store.update_log(id, input.validate(Utc::now())?)?;
    Ok(Json(log))
}

pub async fn partial_update(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    payload: Result<Json<DoseLogInput>, JsonRejection>,
) -> Result<Json<DoseLog>, ApiError> {
    let mut store = state.write_store()?;
    let current = store.log(id)?;
    let Json(input) = payload?;
    let log = store.update_log(id, input.merge(&current))?;
    Ok(Json(log))
}

pub async fn destroy(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<StatusCode, ApiError> {
    state.write_store()?.delete_log(id)?;
    Ok(StatusCode::NO_CONTENT)
}
