//! Media API endpoint
//!
//! Serves blobs from the in-memory media store by ID.

use crate::api::AppState;
use crate::error::AppError;
use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::Response,
};

/// GET /api/media/:id - Raw media bytes
pub async fn get_media(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let media = state
        .orchestrator
        .media()
        .get(&id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Media {}", id)))?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, media.mime_type)
        .header(header::CONTENT_LENGTH, media.data.len())
        .header(header::CACHE_CONTROL, "private, max-age=3600")
        .body(Body::from(media.data))
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to build media response: {}", e)))
}
