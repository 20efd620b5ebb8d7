//! Media Studio Backend
//!
//! REST, SSE and WebSocket server driving one generation session across the
//! studio modes.

use axum::{extract::Request, middleware::Next, response::Response};
use media_studio_backend::api::{self, AppState};
use media_studio_backend::config::Config;
use media_studio_backend::history::HistoryDb;
use media_studio_backend::provider::{AdapterSet, GeminiClient, SpeechAdapter};
use media_studio_backend::studio::{
    BroadcastSink, MediaStore, ModeController, Narrator, Orchestrator,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

/// Audio buffers queued per WebSocket client
const AUDIO_CHANNEL_CAPACITY: usize = 8;

/// Request ID middleware - adds unique ID to each request for tracing
async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let span = info_span!(
        "request",
        request_id = %request_id,
        method = %method,
        uri = %uri,
    );

    let response = next.run(request).instrument(span).await;

    info!(
        request_id = %request_id,
        method = %method,
        uri = %uri,
        status = %response.status().as_u16(),
        duration_ms = start.elapsed().as_millis(),
        "Request completed"
    );

    response
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env();
    config
        .studio
        .validate()
        .map_err(|e| anyhow::anyhow!("{}", e))?;
    info!("Configuration loaded: {:?}", config);

    // Credential gate: nothing starts without a key
    let api_key = std::env::var("GEMINI_API_KEY")
        .ok()
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| anyhow::anyhow!("GEMINI_API_KEY must be set to start the server"))?;

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.client.request_timeout_secs))
        .build()?;
    let client = Arc::new(GeminiClient::new(
        http,
        api_key,
        config.studio.api_base_url.clone(),
    ));

    let media = Arc::new(MediaStore::new());
    let adapters = AdapterSet::gemini(client.clone(), media.clone(), &config.studio);

    let audio = BroadcastSink::new(AUDIO_CHANNEL_CAPACITY);
    let narrator = Narrator::new(
        Arc::new(SpeechAdapter::new(
            client,
            config.studio.speech_model.clone(),
            config.studio.speech_voice.clone(),
        )),
        Arc::new(audio.clone()),
    );

    let mut orchestrator = Orchestrator::new(ModeController::default(), adapters, media)
        .with_narrator(narrator);

    match HistoryDb::new(&config.persistence.history_db, config.studio.history_limit).await {
        Ok(db) => orchestrator = orchestrator.with_history(Arc::new(db)),
        Err(e) => warn!("History disabled, failed to open database: {}", e),
    }

    let state = AppState {
        orchestrator: Arc::new(orchestrator),
        audio,
        config: Arc::new(config.studio.clone()),
    };

    let app = api::router(state)
        // Middleware (order matters - request_id should be first)
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = config
        .server_addr()
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid server address: {}", e))?;

    info!("Server running on http://{}", addr);
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Handle graceful shutdown signals (Ctrl+C, SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down gracefully...");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully...");
        },
    }
}
