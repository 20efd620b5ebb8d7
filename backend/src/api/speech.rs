//! Speech API endpoint
//!
//! Narrates text through the studio narrator. Audio itself is delivered to
//! WebSocket clients; this endpoint only reports whether playback started.

use crate::api::AppState;
use crate::error::AppError;
use crate::studio::SpeakOutcome;
use axum::{extract::State, response::Json};
use serde::{Deserialize, Serialize};

/// Request to narrate text
#[derive(Debug, Default, Deserialize)]
pub struct SpeakRequest {
    /// Text to narrate; the current text result when omitted
    #[serde(default)]
    pub text: Option<String>,
}

/// Narration response
#[derive(Debug, Serialize)]
pub struct SpeakResponse {
    /// `true` if another narration was already playing
    pub skipped: bool,
    /// Playback length in milliseconds (0 when skipped)
    pub duration_ms: u64,
}

/// POST /api/speech - Narrate text
pub async fn speak(
    State(state): State<AppState>,
    Json(request): Json<SpeakRequest>,
) -> Result<Json<SpeakResponse>, AppError> {
    let text = request.text.filter(|t| !t.trim().is_empty());
    let response = match state.orchestrator.speak(text).await? {
        SpeakOutcome::Started { duration_ms, .. } => SpeakResponse {
            skipped: false,
            duration_ms,
        },
        SpeakOutcome::Skipped => SpeakResponse {
            skipped: true,
            duration_ms: 0,
        },
    };
    Ok(Json(response))
}
