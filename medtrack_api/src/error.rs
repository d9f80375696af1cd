//! API error types and their HTTP status mapping.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use medtrack_core::FieldErrors;
use serde_json::json;

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Invalid fields: {0}")]
    Validation(FieldErrors),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Upstream failure: {0}")]
    BadGateway(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(errors) => {
                (StatusCode::BAD_REQUEST, Json(errors)).into_response()
            }
            ApiError::BadRequest(message) => error_body(StatusCode::BAD_REQUEST, message),
            ApiError::NotFound(message) => error_body(StatusCode::NOT_FOUND, message),
            ApiError::BadGateway(message) => error_body(StatusCode::BAD_GATEWAY, message),
            ApiError::Internal(detail) => {
                tracing::error!(detail, "API internal error");
                error_body(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
        }
    }
}

fn error_body(status: StatusCode, message: String) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

impl From<medtrack_core::Error> for ApiError {
    fn from(err: medtrack_core::Error) -> Self {
        use medtrack_core::Error;

        match err {
            Error::Validation(errors) => ApiError::Validation(errors),
            Error::NotFound { .. } => ApiError::NotFound(err.to_string()),
            e if e.is_invalid_input() => ApiError::BadRequest(e.to_string()),
            e if e.is_upstream() => ApiError::BadGateway(e.to_string()),
            e => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}
