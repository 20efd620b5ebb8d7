//! Health and configuration endpoints

use crate::api::AppState;
use crate::studio::StudioConfig;
use axum::{extract::State, response::Json};
use serde::Serialize;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always "healthy" when the server answers
    pub status: String,
    /// Crate version
    pub version: String,
    /// Human-readable message
    pub message: String,
}

/// GET /api/health - Liveness check
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        message: "Media studio backend is healthy".to_string(),
    })
}

/// GET /api/config - Effective engine configuration
pub async fn get_config(State(state): State<AppState>) -> Json<StudioConfig> {
    Json(state.config.as_ref().clone())
}
