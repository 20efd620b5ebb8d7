//! Media Studio Backend Library
//!
//! Generation orchestration engine for a multi-mode media studio, with its
//! HTTP and WebSocket surface. The server binary is in `src/main.rs`.

pub mod api;
pub mod config;
pub mod error;
pub mod history;
pub mod provider;
pub mod studio;
pub mod websocket;
