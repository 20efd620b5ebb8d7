//! API module
//!
//! HTTP request handlers for the studio session, media, history and speech
//! endpoints, plus the shared router state.

pub mod history;
pub mod media;
pub mod session;
pub mod speech;
pub mod system;

use crate::studio::{BroadcastSink, Orchestrator, StudioConfig};
use crate::websocket;
use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;

/// Maximum accepted upload size for an input image
pub const MAX_UPLOAD_BYTES: usize = 7 * 1024 * 1024;

/// State shared by every handler
#[derive(Clone)]
pub struct AppState {
    /// The session engine
    pub orchestrator: Arc<Orchestrator>,
    /// Narrated audio fan-out
    pub audio: BroadcastSink,
    /// Effective engine configuration
    pub config: Arc<StudioConfig>,
}

/// Build the API router (without middleware)
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(system::health_check))
        .route("/api/config", get(system::get_config))
        // Session
        .route("/api/session", get(session::get_session))
        .route("/api/session/events", get(session::session_events))
        .route("/api/session/mode", put(session::set_mode))
        .route("/api/session/directive", put(session::set_directive))
        .route("/api/session/settings", put(session::update_settings))
        .route(
            "/api/session/assets/:slot",
            post(session::upload_asset).delete(session::clear_asset),
        )
        .route("/api/session/submit", post(session::submit))
        .route("/api/session/cancel", post(session::cancel))
        .route("/api/session/chain", post(session::chain))
        // Media and narration
        .route("/api/media/:id", get(media::get_media))
        .route("/api/speech", post(speech::speak))
        // History
        .route(
            "/api/history",
            get(history::list_history).delete(history::clear_history),
        )
        .route("/api/history/:id", delete(history::delete_history_entry))
        // WebSocket for snapshots and narrated audio
        .route("/ws", get(websocket::websocket_handler))
        // multipart framing adds a little on top of the file itself
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + 64 * 1024))
        .with_state(state)
}
