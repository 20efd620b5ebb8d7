//! Studio configuration
//!
//! Model names, provider endpoint and job polling settings.

use crate::studio::error::StudioError;
use serde::Serialize;
use std::env;
use std::time::Duration;

/// Engine configuration
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StudioConfig {
    /// Gemini API base URL
    pub api_base_url: String,
    /// Model for Composite and Generate
    pub image_model: String,
    /// Model for Edit
    pub edit_model: String,
    /// Model for Animate
    pub video_model: String,
    /// Model for Analyze and Culinary
    pub text_model: String,
    /// Model for Reason
    pub reasoning_model: String,
    /// Model for narration
    pub speech_model: String,
    /// Prebuilt voice used for narration
    pub speech_voice: String,
    /// Seconds between job status checks
    pub poll_interval_secs: u64,
    /// Upper bound on a job's total wait; `None` waits indefinitely
    pub poll_timeout_secs: Option<u64>,
    /// Number of prompt history entries kept
    pub history_limit: usize,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            image_model: "gemini-3-pro-image-preview".to_string(),
            edit_model: "gemini-2.5-flash-image".to_string(),
            video_model: "veo-3.1-fast-generate-preview".to_string(),
            text_model: "gemini-2.5-flash".to_string(),
            reasoning_model: "gemini-3-pro-preview".to_string(),
            speech_model: "gemini-2.5-flash-preview-tts".to_string(),
            speech_voice: "Kore".to_string(),
            poll_interval_secs: 5,
            poll_timeout_secs: None,
            history_limit: 20,
        }
    }
}

impl StudioConfig {
    /// Defaults overridden by environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_base_url: env::var("GEMINI_API_BASE_URL").unwrap_or(defaults.api_base_url),
            image_model: env::var("STUDIO_IMAGE_MODEL").unwrap_or(defaults.image_model),
            edit_model: env::var("STUDIO_EDIT_MODEL").unwrap_or(defaults.edit_model),
            video_model: env::var("STUDIO_VIDEO_MODEL").unwrap_or(defaults.video_model),
            text_model: env::var("STUDIO_TEXT_MODEL").unwrap_or(defaults.text_model),
            reasoning_model: env::var("STUDIO_REASONING_MODEL")
                .unwrap_or(defaults.reasoning_model),
            speech_model: env::var("STUDIO_SPEECH_MODEL").unwrap_or(defaults.speech_model),
            speech_voice: env::var("STUDIO_SPEECH_VOICE").unwrap_or(defaults.speech_voice),
            poll_interval_secs: env::var("POLL_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.poll_interval_secs),
            poll_timeout_secs: env::var("POLL_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .or(defaults.poll_timeout_secs),
            history_limit: env::var("HISTORY_LIMIT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.history_limit),
        }
    }

    /// Check that every setting is usable
    pub fn validate(&self) -> Result<(), StudioError> {
        if self.api_base_url.trim().is_empty() {
            return Err(invalid("api_base_url cannot be empty"));
        }
        for (name, value) in [
            ("image_model", &self.image_model),
            ("edit_model", &self.edit_model),
            ("video_model", &self.video_model),
            ("text_model", &self.text_model),
            ("reasoning_model", &self.reasoning_model),
            ("speech_model", &self.speech_model),
            ("speech_voice", &self.speech_voice),
        ] {
            if value.trim().is_empty() {
                return Err(invalid(&format!("{} cannot be empty", name)));
            }
        }
        if self.poll_interval_secs == 0 {
            return Err(invalid("poll_interval_secs must be > 0"));
        }
        if self.poll_timeout_secs == Some(0) {
            return Err(invalid("poll_timeout_secs must be > 0"));
        }
        if self.history_limit == 0 {
            return Err(invalid("history_limit must be > 0"));
        }
        Ok(())
    }

    /// Status check interval as a duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Total wait budget as a duration
    pub fn poll_timeout(&self) -> Option<Duration> {
        self.poll_timeout_secs.map(Duration::from_secs)
    }
}

fn invalid(message: &str) -> StudioError {
    StudioError::InvalidState(format!("Invalid configuration: {}", message))
}
