//! Medication endpoints.
//!
//! - `GET/POST /medications`
//! - `GET/PUT/PATCH/DELETE /medications/{id}`
//! - `GET /medications/{id}/info`: OpenFDA label, 502 when the lookup fails
//! - `GET /medications/{id}/expected-doses?days=N`
//! - `GET /medications/{id}/adherence[?start=..&end=..]`

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::NaiveDate;
use serde::Serialize;

use medtrack_core::{adherence, external, Medication, MedicationInput};

use crate::error::ApiError;
use crate::query::{DateRangeQuery, DaysQuery};
use crate::state::AppState;

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Medication>>, ApiError> {
    Ok(Json(state.read_store()?.medications()))
}

pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<MedicationInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Medication>), ApiError> {
    let Json(input) = payload?;
    let draft = input.validate()?;
    let medication = state.write_store()?.create_medication(draft)?;
    tracing::info!(id = medication.id, "Created medication {}", medication);
    Ok((StatusCode::CREATED, Json(medication)))
}

pub async fn retrieve(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Medication>, ApiError> {
    Ok(Json(state.read_store()?.medication(id)?))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    payload: Result<Json<MedicationInput>, JsonRejection>,
) -> Result<Json<Medication>, ApiError> {
    let mut store = state.write_store()?;
    store.medication(id)?;
    let Json(input) = payload?;
    let medication = store.update_medication(id, input.validate()?)?;
    Ok(Json(medication))
}

pub async fn partial_update(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    payload: Result<Json<MedicationInput>, JsonRejection>,
) -> Result<Json<Medication>, ApiError> {
    let mut store = state.write_store()?;
    let current = store.medication(id)?;
    let Json(input) = payload?;
    let medication = store.update_medication(id, input.merge(&current)?)?;
    Ok(Json(medication))
}

pub async fn destroy(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<StatusCode, ApiError> {
    state.write_store()?.delete_medication(id)?;
    tracing::info!(id, "Deleted medication");
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /medications/{id}/info`
pub async fn info(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Response, ApiError> {
    // Guard is dropped before the lookup is awaited.
    let medication = state.read_store()?.medication(id)?;
    let result = external::fetch_external_info(&medication, state.drug_info.as_ref()).await;

    let status = if result.error().is_some() {
        StatusCode::BAD_GATEWAY
    } else {
        StatusCode::OK
    };
    Ok((status, Json(result)).into_response())
}

#[derive(Debug, Serialize)]
pub struct ExpectedDosesResponse {
    pub medication_id: u64,
    pub days: u32,
    pub expected_doses: i64,
}

/// `GET /medications/{id}/expected-doses?days=N`
pub async fn expected_doses(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Query(query): Query<DaysQuery>,
) -> Result<Json<ExpectedDosesResponse>, ApiError> {
    let days = query.positive_days()?;
    let medication = state.read_store()?.medication(id)?;
    let expected_doses = adherence::expected_doses(&medication, days)?;

    Ok(Json(ExpectedDosesResponse {
        medication_id: medication.id,
        days,
        expected_doses,
    }))
}

#[derive(Debug, Serialize)]
pub struct AdherenceResponse {
    pub medication_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<NaiveDate>,
    pub adherence_rate: f64,
}

/// `GET /medications/{id}/adherence`
///
/// Without a range: share of logged events that were taken. With one: share
/// of the doses expected in the range that were logged as taken.
pub async fn adherence(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Query(query): Query<DateRangeQuery>,
) -> Result<Json<AdherenceResponse>, ApiError> {
    let range = query.optional()?;
    let (medication, logs) = {
        let store = state.read_store()?;
        let medication = store.medication(id)?;
        let logs = store.logs_for(id);
        (medication, logs)
    };

    let response = match range {
        None => AdherenceResponse {
            medication_id: id,
            start: None,
            end: None,
            adherence_rate: adherence::adherence_rate(&medication, &logs),
        },
        Some((start, end)) => AdherenceResponse {
            medication_id: id,
            start: Some(start),
            end: Some(end),
            adherence_rate: adherence::adherence_rate_over_period(
                &medication,
                &logs,
                start,
                end,
            )?,
        },
    };
    Ok(Json(response))
}
