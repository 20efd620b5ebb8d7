//! Session API endpoints
//!
//! Inputs, submit, cancel and chaining for the single studio session, plus a
//! Server-Sent Events feed of session snapshots.

use crate::api::{AppState, MAX_UPLOAD_BYTES};
use crate::error::AppError;
use crate::studio::{
    AspectRatio, AssetSlot, InputAsset, Mode, ResolutionTier, SessionSnapshot,
};
use axum::{
    body::Body,
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{Json, Response},
};
use futures_util::stream::Stream;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

/// Image types accepted as input assets
pub const ACCEPTED_IMAGE_TYPES: &[&str] = &[
    "image/png",
    "image/jpeg",
    "image/webp",
    "image/heic",
    "image/heif",
];

/// Request to switch mode
#[derive(Debug, Deserialize)]
pub struct SetModeRequest {
    /// Target mode
    pub mode: Mode,
}

/// Request to replace the directive
#[derive(Debug, Deserialize)]
pub struct SetDirectiveRequest {
    /// New directive text
    pub directive: String,
}

/// Partial settings update
#[derive(Debug, Default, Deserialize)]
pub struct UpdateSettingsRequest {
    /// Output aspect ratio
    pub aspect_ratio: Option<AspectRatio>,
    /// Output resolution tier
    pub resolution: Option<ResolutionTier>,
    /// Composite ownership confirmation
    pub ownership_verified: Option<bool>,
}

/// Request to chain the current result
#[derive(Debug, Deserialize)]
pub struct ChainRequest {
    /// Mode that receives the result
    pub target_mode: Mode,
}

/// Cancel response
#[derive(Debug, Serialize)]
pub struct CancelResponse {
    /// Whether a running job was told to stop
    pub cancelled: bool,
}

/// GET /api/session - Current snapshot
pub async fn get_session(State(state): State<AppState>) -> Json<SessionSnapshot> {
    Json(state.orchestrator.snapshot().await)
}

/// GET /api/session/events - Snapshot stream (SSE)
pub async fn session_events(State(state): State<AppState>) -> Result<Response, AppError> {
    let sse_stream = snapshot_stream(state).map(|snapshot| {
        let data = serde_json::to_string(&snapshot).unwrap_or_else(|e| {
            error!("Failed to serialize snapshot: {}", e);
            "{}".to_string()
        });
        Ok::<_, std::io::Error>(format!("event: snapshot\ndata: {}\n\n", data))
    });

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/event-stream")
        .header(header::CACHE_CONTROL, "no-cache")
        .header(header::CONNECTION, "keep-alive")
        .body(Body::from_stream(sse_stream))
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to build SSE response: {}", e)))
}

/// Every snapshot, starting with the current one
pub fn snapshot_stream(state: AppState) -> impl Stream<Item = SessionSnapshot> {
    use async_stream::stream;

    let mut updates = state.orchestrator.subscribe();
    stream! {
        loop {
            let snapshot = updates.borrow_and_update().clone();
            yield snapshot;
            if updates.changed().await.is_err() {
                break;
            }
        }
    }
}

/// PUT /api/session/mode - Switch mode
pub async fn set_mode(
    State(state): State<AppState>,
    Json(request): Json<SetModeRequest>,
) -> Result<Json<SessionSnapshot>, AppError> {
    Ok(Json(state.orchestrator.set_mode(request.mode).await?))
}

/// PUT /api/session/directive - Replace the directive
pub async fn set_directive(
    State(state): State<AppState>,
    Json(request): Json<SetDirectiveRequest>,
) -> Json<SessionSnapshot> {
    Json(state.orchestrator.set_directive(request.directive).await)
}

/// PUT /api/session/settings - Update output settings
pub async fn update_settings(
    State(state): State<AppState>,
    Json(request): Json<UpdateSettingsRequest>,
) -> Json<SessionSnapshot> {
    Json(
        state
            .orchestrator
            .update_settings(
                request.aspect_ratio,
                request.resolution,
                request.ownership_verified,
            )
            .await,
    )
}

/// POST /api/session/assets/:slot - Upload an input image
///
/// Accepts multipart form data with a single `file` field.
pub async fn upload_asset(
    State(state): State<AppState>,
    Path(slot): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<SessionSnapshot>, AppError> {
    let slot: AssetSlot = slot.parse().map_err(AppError::BadRequest)?;

    let mut upload: Option<(Vec<u8>, String, Option<String>)> = None;
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        AppError::BadRequest(format!("Failed to read multipart field: {}", e))
    })? {
        if field.name() != Some("file") {
            continue;
        }
        let mime_type = field.content_type().unwrap_or("").to_string();
        let file_name = field.file_name().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read file data: {}", e)))?;
        upload = Some((data.to_vec(), mime_type, file_name));
    }

    let (data, mime_type, file_name) =
        upload.ok_or_else(|| AppError::BadRequest("Missing file field".to_string()))?;
    let asset = ingest_upload(&state, data, &mime_type).await?;

    info!(
        slot = ?slot,
        mime_type = %mime_type,
        file_name = file_name.as_deref().unwrap_or(""),
        size = asset.data.len(),
        "Asset uploaded"
    );
    Ok(Json(state.orchestrator.set_asset(slot, asset).await))
}

/// Validate an uploaded image and keep a previewable copy in the media store
pub async fn ingest_upload(
    state: &AppState,
    data: Vec<u8>,
    mime_type: &str,
) -> Result<InputAsset, AppError> {
    if data.is_empty() {
        return Err(AppError::BadRequest("Uploaded file is empty".to_string()));
    }
    if data.len() > MAX_UPLOAD_BYTES {
        return Err(AppError::PayloadTooLarge(format!(
            "Image file too large: {} bytes (limit {})",
            data.len(),
            MAX_UPLOAD_BYTES
        )));
    }
    if !ACCEPTED_IMAGE_TYPES.contains(&mime_type) {
        return Err(AppError::BadRequest(format!(
            "Unsupported image type: {}",
            if mime_type.is_empty() { "unknown" } else { mime_type }
        )));
    }

    let locator = state
        .orchestrator
        .media()
        .put(data.clone(), mime_type)
        .await;
    Ok(InputAsset::new(data, mime_type, locator.as_str()))
}

/// DELETE /api/session/assets/:slot - Remove an input image
pub async fn clear_asset(
    State(state): State<AppState>,
    Path(slot): Path<String>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let slot: AssetSlot = slot.parse().map_err(AppError::BadRequest)?;
    Ok(Json(state.orchestrator.clear_asset(slot).await))
}

/// POST /api/session/submit - Start a job
///
/// Returns as soon as the job is running; follow progress via
/// `/api/session/events` or `/ws`.
pub async fn submit(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<SessionSnapshot>), AppError> {
    let snapshot = state.orchestrator.spawn_submit().await?;
    Ok((StatusCode::ACCEPTED, Json(snapshot)))
}

/// POST /api/session/cancel - Cancel the running job
///
/// Only a job that is being polled (Animate) can be interrupted. For any other
/// job `cancelled` is `false` and the job runs to completion.
pub async fn cancel(State(state): State<AppState>) -> Json<CancelResponse> {
    Json(CancelResponse {
        cancelled: state.orchestrator.cancel(),
    })
}

/// POST /api/session/chain - Feed the current result into another mode
pub async fn chain(
    State(state): State<AppState>,
    Json(request): Json<ChainRequest>,
) -> Result<Json<SessionSnapshot>, AppError> {
    Ok(Json(state.orchestrator.chain(request.target_mode).await?))
}
