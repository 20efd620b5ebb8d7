//! History data models

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A previously submitted directive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct HistoryEntry {
    /// Unique identifier for the entry
    pub id: String,
    /// Directive text as submitted
    pub text: String,
    /// When the entry was recorded (Unix timestamp in milliseconds)
    pub timestamp: i64,
}

impl HistoryEntry {
    /// Create an entry stamped with the current time
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text: text.into(),
            timestamp: Utc::now().timestamp_millis(),
        }
    }
}
