//! History database operations
//!
//! Keeps the most recent directives in SQLite. Consecutive duplicates are
//! suppressed and the table is trimmed to a fixed number of entries.

use crate::history::models::HistoryEntry;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info};

/// Errors raised by the history store
#[derive(Error, Debug)]
pub enum HistoryError {
    /// The database file or its directory could not be prepared
    #[error("History storage error: {0}")]
    Storage(String),

    /// A query failed
    #[error("History query failed: {0}")]
    Query(#[from] sqlx::Error),
}

/// Connection pool for prompt history
pub struct HistoryDb {
    pool: SqlitePool,
    limit: usize,
}

impl HistoryDb {
    /// Open (or create) the history database
    ///
    /// # Arguments
    /// * `db_path` - Path to the SQLite database file
    /// * `limit` - Number of entries retained
    pub async fn new(db_path: &str, limit: usize) -> Result<Self, HistoryError> {
        if let Some(parent) = PathBuf::from(db_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    HistoryError::Storage(format!("Failed to create db directory: {}", e))
                })?;
            }
        }

        let connection_string = if db_path.starts_with("sqlite:") {
            db_path.to_string()
        } else {
            format!("sqlite:{}", db_path)
        };

        let options = SqliteConnectOptions::from_str(&connection_string)
            .map_err(|e| HistoryError::Storage(format!("Invalid database path: {}", e)))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        info!(path = %db_path, limit, "Connected to history database");

        let db = Self { pool, limit };
        db.run_migrations().await?;
        Ok(db)
    }

    async fn run_migrations(&self) -> Result<(), HistoryError> {
        let migration_sql = include_str!("../../migrations/001_create_history.sql");

        let mut cleaned_sql = String::new();
        for line in migration_sql.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with("--") {
                continue;
            }
            let without_comments = match trimmed.find("--") {
                Some(pos) => &trimmed[..pos],
                None => trimmed,
            };
            cleaned_sql.push_str(without_comments.trim());
            cleaned_sql.push(' ');
        }

        for statement in cleaned_sql
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            sqlx::query(statement).execute(&self.pool).await?;
        }

        debug!("History migrations completed");
        Ok(())
    }

    /// Number of entries retained
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Record a submitted directive
    ///
    /// Returns `None` when `text` is empty or equals the most recent entry.
    pub async fn record(&self, text: &str) -> Result<Option<HistoryEntry>, HistoryError> {
        if text.trim().is_empty() {
            return Ok(None);
        }

        let mut tx = self.pool.begin().await?;

        let latest: Option<(String,)> =
            sqlx::query_as("SELECT text FROM prompt_history ORDER BY seq DESC LIMIT 1")
                .fetch_optional(&mut *tx)
                .await?;
        if latest.map(|(t,)| t == text).unwrap_or(false) {
            debug!("Directive matches latest history entry, skipping");
            return Ok(None);
        }

        let entry = HistoryEntry::new(text);
        sqlx::query("INSERT INTO prompt_history (id, text, timestamp) VALUES (?, ?, ?)")
            .bind(&entry.id)
            .bind(&entry.text)
            .bind(entry.timestamp)
            .execute(&mut *tx)
            .await?;

        let trimmed = sqlx::query(
            "DELETE FROM prompt_history WHERE seq NOT IN \
             (SELECT seq FROM prompt_history ORDER BY seq DESC LIMIT ?)",
        )
        .bind(self.limit as i64)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        tx.commit().await?;

        debug!(id = %entry.id, trimmed, "Recorded history entry");
        Ok(Some(entry))
    }

    /// All entries, most recent first
    pub async fn list(&self) -> Result<Vec<HistoryEntry>, HistoryError> {
        let entries = sqlx::query_as::<_, HistoryEntry>(
            "SELECT id, text, timestamp FROM prompt_history ORDER BY seq DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }

    /// Delete one entry; returns whether it existed
    pub async fn delete(&self, id: &str) -> Result<bool, HistoryError> {
        let result = sqlx::query("DELETE FROM prompt_history WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        debug!(id = %id, deleted = result.rows_affected(), "Deleted history entry");
        Ok(result.rows_affected() > 0)
    }

    /// Delete every entry; returns how many were removed
    pub async fn clear(&self) -> Result<u64, HistoryError> {
        let result = sqlx::query("DELETE FROM prompt_history")
            .execute(&self.pool)
            .await?;
        info!(removed = result.rows_affected(), "Cleared history");
        Ok(result.rows_affected())
    }
}
