//! Error types and error handling for the application
//!
//! `AppError` is what HTTP handlers return. It wraps engine and history
//! failures and converts every variant into a JSON error response.

use crate::history::HistoryError;
use crate::studio::StudioError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Application-level error types
///
/// Each variant maps to one HTTP status via `IntoResponse`.
#[derive(Error, Debug)]
pub enum AppError {
    /// Error raised by the generation engine
    #[error(transparent)]
    Studio(#[from] StudioError),

    /// Error raised by the history store
    #[error(transparent)]
    History(#[from] HistoryError),

    /// Requested resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Request was malformed or violated an input constraint
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Uploaded payload exceeds the size limit
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// Internal server error (catch-all for unexpected errors)
    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// HTTP status for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Studio(e) => match e {
                StudioError::InvalidState(_) => StatusCode::CONFLICT,
                StudioError::Chain(_) => StatusCode::UNPROCESSABLE_ENTITY,
                StudioError::Provider(_) => StatusCode::BAD_GATEWAY,
                StudioError::Decode(_) => StatusCode::BAD_GATEWAY,
                StudioError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
                StudioError::Cancelled => StatusCode::CONFLICT,
            },
            AppError::History(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self, "Request failed");
        }

        let body = Json(json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}
