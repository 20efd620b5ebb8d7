//! WebSocket handlers for real-time updates
//!
//! Streams session snapshots and narrated audio buffers to connected clients.
//! Supports ping/pong for connection keepalive.

use crate::api::AppState;
use crate::studio::{AudioBuffer, SessionSnapshot};
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, error, info, warn};

/// WebSocket message types for real-time communication
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "type")]
pub enum WebSocketMessage {
    /// Session changed
    #[serde(rename = "session_snapshot")]
    SessionSnapshot {
        /// New session view
        snapshot: serde_json::Value,
    },
    /// Narrated audio to play
    #[serde(rename = "audio")]
    Audio {
        /// Samples per second
        sample_rate: u32,
        /// Channel count
        channels: u16,
        /// Normalized samples in [-1.0, 1.0)
        samples: Vec<f32>,
    },
    /// Ping message for connection keepalive
    #[serde(rename = "ping")]
    Ping,
    /// Pong message responding to ping
    #[serde(rename = "pong")]
    Pong,
}

impl WebSocketMessage {
    /// Wrap a snapshot
    pub fn snapshot(snapshot: &SessionSnapshot) -> Self {
        WebSocketMessage::SessionSnapshot {
            snapshot: serde_json::to_value(snapshot).unwrap_or(serde_json::Value::Null),
        }
    }

    /// Wrap an audio buffer
    pub fn audio(buffer: &AudioBuffer) -> Self {
        WebSocketMessage::Audio {
            sample_rate: buffer.sample_rate,
            channels: buffer.channels,
            samples: buffer.samples.clone(),
        }
    }

    fn into_message(self) -> Option<Message> {
        match serde_json::to_string(&self) {
            Ok(text) => Some(Message::Text(text)),
            Err(e) => {
                error!("Failed to serialize WebSocket message: {}", e);
                None
            }
        }
    }
}

/// WebSocket upgrade handler
///
/// The current snapshot is sent immediately, followed by every change.
pub async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

// Handle WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();

    info!("WebSocket client connected");

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<Message>();

    // Forward queued messages to the socket
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if let Err(e) = sender.send(msg).await {
                error!("Failed to send message: {}", e);
                break;
            }
        }
    });

    // Session snapshots
    let snapshot_tx = tx.clone();
    let mut snapshots = WatchStream::new(state.orchestrator.subscribe());
    let mut snapshot_task = tokio::spawn(async move {
        while let Some(snapshot) = snapshots.next().await {
            let Some(msg) = WebSocketMessage::snapshot(&snapshot).into_message() else {
                continue;
            };
            if snapshot_tx.send(msg).is_err() {
                break;
            }
        }
    });

    // Narrated audio
    let audio_tx = tx.clone();
    let mut audio = state.audio.subscribe();
    let mut audio_task = tokio::spawn(async move {
        loop {
            let buffer: Arc<AudioBuffer> = match audio.recv().await {
                Ok(buffer) => buffer,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "WebSocket client lagged behind audio");
                    continue;
                }
                Err(RecvError::Closed) => break,
            };
            let Some(msg) = WebSocketMessage::audio(&buffer).into_message() else {
                continue;
            };
            if audio_tx.send(msg).is_err() {
                break;
            }
        }
    });

    // Periodic pings
    let ping_tx = tx.clone();
    let mut ping_task = tokio::spawn(async move {
        loop {
            tokio::time::sleep(tokio::time::Duration::from_secs(30)).await;
            if ping_tx.send(Message::Ping(vec![])).is_err() {
                break;
            }
        }
    });

    // Receive messages
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    match serde_json::from_str::<WebSocketMessage>(&text) {
                        Ok(WebSocketMessage::Ping) => {
                            let Some(pong) = WebSocketMessage::Pong.into_message() else {
                                continue;
                            };
                            if tx.send(pong).is_err() {
                                break;
                            }
                        }
                        Ok(other) => warn!("Received unhandled WebSocket message: {:?}", other),
                        Err(e) => debug!("Ignoring malformed WebSocket message: {}", e),
                    }
                }
                Ok(Message::Close(_)) => {
                    info!("WebSocket client disconnected");
                    break;
                }
                Ok(Message::Pong(_)) => {}
                Err(e) => {
                    error!("WebSocket error: {}", e);
                    break;
                }
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => {}
        _ = &mut snapshot_task => {}
        _ = &mut audio_task => {}
        _ = &mut ping_task => {}
        _ = &mut recv_task => {}
    }
    send_task.abort();
    snapshot_task.abort();
    audio_task.abort();
    ping_task.abort();
    recv_task.abort();

    info!("WebSocket connection closed");
}
