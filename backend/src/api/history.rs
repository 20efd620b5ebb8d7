//! History API endpoints
//!
//! Lists and prunes the prompt history.

use crate::api::AppState;
use crate::error::AppError;
use crate::history::{HistoryDb, HistoryEntry};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde::Serialize;
use std::sync::Arc;

/// Clear response
#[derive(Debug, Serialize)]
pub struct ClearHistoryResponse {
    /// Number of entries removed
    pub removed: u64,
}

fn history_db(state: &AppState) -> Result<&Arc<HistoryDb>, AppError> {
    state
        .orchestrator
        .history()
        .ok_or_else(|| AppError::NotFound("History is not enabled".to_string()))
}

/// GET /api/history - All entries, most recent first
pub async fn list_history(
    State(state): State<AppState>,
) -> Result<Json<Vec<HistoryEntry>>, AppError> {
    Ok(Json(history_db(&state)?.list().await?))
}

/// DELETE /api/history/:id - Remove one entry
pub async fn delete_history_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    if history_db(&state)?.delete(&id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("History entry {}", id)))
    }
}

/// DELETE /api/history - Remove every entry
pub async fn clear_history(
    State(state): State<AppState>,
) -> Result<Json<ClearHistoryResponse>, AppError> {
    let removed = history_db(&state)?.clear().await?;
    Ok(Json(ClearHistoryResponse { removed }))
}
