// src/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::store::StoreError;

/// Failures of the answer-submission flow.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScoringError {
    #[error("authentication required")]
    Unauthenticated,

    #[error("invalid answer: {0}")]
    InvalidAnswer(String),

    #[error("task {0} not found")]
    TaskNotFound(i64),

    /// The atomic step kept conflicting after every retry.
    #[error("submission conflicted with a concurrent update")]
    ConcurrencyConflict,

    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
}

impl From<StoreError> for ScoringError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict => ScoringError::ConcurrencyConflict,
            StoreError::UnknownUser(_) => ScoringError::Unauthenticated,
            StoreError::Unavailable(detail) => ScoringError::StorageUnavailable(detail),
        }
    }
}

/// Global Application Error Enum.
/// Centralizes error handling and mapping to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    // 500 Internal Server Error
    #[error("internal server error: {0}")]
    InternalServerError(String),

    // 503 Service Unavailable
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    // 400 Bad Request
    #[error("bad request: {0}")]
    BadRequest(String),

    // 401 Unauthorized
    #[error("unauthorized: {0}")]
    AuthError(String),

    // 404 Not Found
    #[error("not found: {0}")]
    NotFound(String),
}

/// Implements `IntoResponse` for `AppError`.
/// Converts the error into a JSON response with appropriate HTTP status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            AppError::ServiceUnavailable(msg) => {
                tracing::error!("Service Unavailable: {}", msg);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Service temporarily unavailable, please retry".to_string(),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::AuthError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
        };
        let body = Json(json!({
            "success": false,
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<ScoringError> for AppError {
    fn from(err: ScoringError) -> Self {
        match err {
            ScoringError::Unauthenticated => {
                AppError::AuthError("Authentication required".to_string())
            }
            ScoringError::InvalidAnswer(reason) => AppError::BadRequest(reason),
            ScoringError::TaskNotFound(_) => AppError::NotFound("Task not found".to_string()),
            ScoringError::ConcurrencyConflict => {
                AppError::ServiceUnavailable("submission kept conflicting".to_string())
            }
            ScoringError::StorageUnavailable(detail) => AppError::ServiceUnavailable(detail),
        }
    }
}

/// Read paths surface storage failures directly.
impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::from(ScoringError::from(err))
    }
}
