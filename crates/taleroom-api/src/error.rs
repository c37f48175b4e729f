//! Taleroom — API error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use taleroom_core::error::RelayError;
use taleroom_core::narrator::NarratorError;
use thiserror::Error;

/// Startup and runtime errors for the API server.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// The narrator client could not be built.
    #[error("narrator error: {0}")]
    Narrator(#[from] NarratorError),

    /// Network binding or I/O error.
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

/// JSON body returned for error responses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code.
    pub error: &'static str,
    /// Human-readable error message.
    pub message: String,
}

/// HTTP-layer wrapper around `RelayError` that implements `IntoResponse`.
#[derive(Debug)]
pub struct ApiError(pub RelayError);

impl From<RelayError> for ApiError {
    fn from(err: RelayError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = match &self.0 {
            RelayError::RoomNotFound(_) => (StatusCode::NOT_FOUND, "room_not_found"),
            RelayError::ParticipantNotFound { .. } => {
                (StatusCode::NOT_FOUND, "participant_not_found")
            }
            RelayError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            RelayError::ConnectionClosed(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "connection_closed")
            }
            RelayError::ConnectionBacklogged(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "connection_backlogged")
            }
        };

        let body = ErrorBody {
            error: error_code,
            message: self.0.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
