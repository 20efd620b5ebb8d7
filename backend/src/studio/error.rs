//! Studio error types
//!
//! Errors raised by the generation engine (state machine, providers, codec).

use thiserror::Error;

/// Errors that can occur while driving a generation session
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StudioError {
    /// An operation was attempted in a session state that does not allow it
    #[error("Invalid session state: {0}")]
    InvalidState(String),

    /// The backend call failed or returned no usable payload
    #[error("Provider error: {0}")]
    Provider(String),

    /// Re-ingesting a generated artifact as a new input failed
    #[error("Chain error: {0}")]
    Chain(String),

    /// An audio payload could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    /// A long-running job did not finish within the configured budget
    #[error("Job timed out after {0} seconds")]
    Timeout(u64),

    /// A long-running job was cancelled before it finished
    #[error("Job cancelled")]
    Cancelled,
}

impl StudioError {
    /// Shorthand for a provider error
    pub fn provider(message: impl Into<String>) -> Self {
        StudioError::Provider(message.into())
    }
}
