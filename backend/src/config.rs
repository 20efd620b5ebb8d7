//! Application configuration
//!
//! Centralized configuration management with environment variable support
//! and sensible defaults. Engine settings live in [`StudioConfig`].

use crate::studio::StudioConfig;
use std::env;
use std::path::PathBuf;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Persistence configuration
    pub persistence: PersistenceConfig,
    /// Outbound HTTP client configuration
    pub client: ClientConfig,
    /// Engine configuration
    pub studio: StudioConfig,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to bind the server to
    pub port: u16,
    /// Host address to bind to
    pub host: String,
}

/// Persistence configuration
#[derive(Debug, Clone)]
pub struct PersistenceConfig {
    /// Base directory for application data
    pub data_dir: String,
    /// SQLite file holding prompt history
    pub history_db: String,
}

/// Outbound HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Timeout for a single provider request (in seconds)
    pub request_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        let data_dir = env::var("DATA_DIR").unwrap_or_else(|_| {
            if let Some(home) = env::var_os("HOME") {
                format!("{}/.media-studio", home.to_string_lossy())
            } else {
                ".media-studio".to_string()
            }
        });
        let history_db = env::var("HISTORY_DB").unwrap_or_else(|_| {
            PathBuf::from(&data_dir)
                .join("history.db")
                .to_string_lossy()
                .into_owned()
        });

        Self {
            server: ServerConfig {
                port: env::var("PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(8080),
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            },
            persistence: PersistenceConfig {
                data_dir,
                history_db,
            },
            client: ClientConfig {
                request_timeout_secs: env::var("REQUEST_TIMEOUT_SECS")
                    .ok()
                    .and_then(|t| t.parse().ok())
                    .unwrap_or(120),
            },
            studio: StudioConfig::from_env(),
        }
    }

    /// Get the server address as a string
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
