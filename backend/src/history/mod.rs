//! Prompt history
//!
//! SQLite-backed list of recently submitted directives, most recent first.

pub mod db;
pub mod models;

pub use db::{HistoryDb, HistoryError};
pub use models::HistoryEntry;
