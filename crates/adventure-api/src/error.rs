//! Adventure API: error types.

use adventure_core::error::DomainError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Startup errors for the API server.
#[derive(Debug, Error)]
pub enum AppError {
    /// An environment variable is invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// The PostgreSQL pool could not connect.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The listener could not bind or serve.
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),

    /// The tracing pipeline could not be installed.
    #[error("telemetry error: {0}")]
    Telemetry(String),

    /// Store preparation, seed loading or model setup failed.
    #[error("startup error: {0}")]
    Startup(#[from] DomainError),
}

/// Error payload: `{ "error", "message", "retryable" }`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Stable snake_case code.
    pub error: &'static str,
    pub message: String,
    /// Whether resubmitting the same request may succeed.
    pub retryable: bool,
}

/// Renders a `DomainError` as a status code plus `ErrorBody`.
#[derive(Debug)]
pub struct ApiError(pub DomainError);

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = match &self.0 {
            DomainError::InvalidChoice(_) => (StatusCode::BAD_REQUEST, "invalid_choice"),
            DomainError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            DomainError::PlayerNotFound(_) => (StatusCode::NOT_FOUND, "player_not_found"),
            DomainError::ConcurrencyConflict { .. } => {
                (StatusCode::CONFLICT, "concurrency_conflict")
            }
            DomainError::TransientFailure(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "transient_failure")
            }
            DomainError::GenerationFailure(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "generation_failure")
            }
            DomainError::Infrastructure(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "infrastructure_error")
            }
        };
        if status.is_server_error() {
            error!(error = %self.0, "request failed");
        }

        let body = ErrorBody {
            error: error_code,
            message: self.0.to_string(),
            retryable: self.0.is_retryable(),
        };

        (status, Json(body)).into_response()
    }
}
