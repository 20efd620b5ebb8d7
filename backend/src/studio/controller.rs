//! Mode controller
//!
//! The session state machine. Owns the current mode, inputs, result and
//! lifecycle state, and decides whether a submit is currently allowed.
//! Every mutation publishes a fresh [`SessionSnapshot`] on a watch channel.

use crate::studio::chainer::ChainSeed;
use crate::studio::constants::{MEDIA_ROUTE_PREFIX, STATUS_DONE, STATUS_FAILED, STATUS_READY};
use crate::studio::error::StudioError;
use crate::studio::types::{
    AspectRatio, AssetSlot, InputAsset, MediaLocator, Mode, RequestDescriptor, ResolutionTier,
    ResultArtifact, SessionSnapshot, SessionStatus,
};
use std::collections::HashSet;
use tokio::sync::watch;
use tracing::{debug, info};

/// Session state machine
#[derive(Debug)]
pub struct ModeController {
    mode: Mode,
    primary: Option<InputAsset>,
    reference: Option<InputAsset>,
    directive: String,
    aspect_ratio: AspectRatio,
    resolution: ResolutionTier,
    ownership_verified: bool,
    status: SessionStatus,
    status_message: String,
    result: Option<ResultArtifact>,
    error: Option<String>,
    updates: watch::Sender<SessionSnapshot>,
}

impl Default for ModeController {
    fn default() -> Self {
        Self::new(Mode::Generate)
    }
}

impl ModeController {
    /// Create an idle session in the given mode
    pub fn new(mode: Mode) -> Self {
        let mut controller = Self {
            mode,
            primary: None,
            reference: None,
            directive: String::new(),
            aspect_ratio: AspectRatio::default(),
            resolution: ResolutionTier::default(),
            ownership_verified: false,
            status: SessionStatus::Idle,
            status_message: STATUS_READY.to_string(),
            result: None,
            error: None,
            updates: watch::channel(SessionSnapshot::placeholder(mode)).0,
        };
        controller.publish();
        controller
    }

    /// Current mode
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Current lifecycle state
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// Current directive text
    pub fn directive(&self) -> &str {
        &self.directive
    }

    /// Current result, if any
    pub fn result(&self) -> Option<&ResultArtifact> {
        self.result.as_ref()
    }

    /// Asset in the given slot, if any
    pub fn asset(&self, slot: AssetSlot) -> Option<&InputAsset> {
        match slot {
            AssetSlot::Primary => self.primary.as_ref(),
            AssetSlot::Reference => self.reference.as_ref(),
        }
    }

    /// Media-store locators the session still points at
    ///
    /// Covers the image or video result and any input asset whose display
    /// reference is a media-store locator.
    pub fn media_refs(&self) -> HashSet<MediaLocator> {
        let result = match &self.result {
            Some(ResultArtifact::Image { locator, .. } | ResultArtifact::Video { locator, .. }) => {
                Some(locator.clone())
            }
            _ => None,
        };
        let assets = [&self.primary, &self.reference]
            .into_iter()
            .flatten()
            .filter(|asset| asset.display_ref.starts_with(MEDIA_ROUTE_PREFIX))
            .map(|asset| MediaLocator(asset.display_ref.clone()));
        result.into_iter().chain(assets).collect()
    }

    /// Subscribe to snapshots; the receiver starts with the current state
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.updates.subscribe()
    }

    /// Switch mode
    ///
    /// Refused while a job is in flight. Clears the result and returns to Idle;
    /// input assets are kept so the same image can be tried across modes.
    pub fn set_mode(&mut self, mode: Mode) -> Result<(), StudioError> {
        if self.status == SessionStatus::Generating {
            return Err(StudioError::InvalidState(
                "Cannot switch mode while a job is running".to_string(),
            ));
        }

        info!(from = %self.mode, to = %mode, "Switching mode");
        self.mode = mode;
        self.reset_outcome();
        self.publish();
        Ok(())
    }

    /// Replace the directive text
    pub fn set_directive(&mut self, directive: impl Into<String>) {
        self.directive = directive.into();
        self.publish();
    }

    /// Replace the asset in a slot
    pub fn set_asset(&mut self, slot: AssetSlot, asset: InputAsset) {
        debug!(slot = ?slot, mime_type = %asset.mime_type, size = asset.data.len(), "Asset set");
        match slot {
            AssetSlot::Primary => self.primary = Some(asset),
            AssetSlot::Reference => self.reference = Some(asset),
        }
        self.publish();
    }

    /// Clear a slot; returns the removed asset
    pub fn clear_asset(&mut self, slot: AssetSlot) -> Option<InputAsset> {
        let removed = match slot {
            AssetSlot::Primary => self.primary.take(),
            AssetSlot::Reference => self.reference.take(),
        };
        self.publish();
        removed
    }

    /// Select the output aspect ratio
    pub fn set_aspect_ratio(&mut self, aspect_ratio: AspectRatio) {
        self.aspect_ratio = aspect_ratio;
        self.publish();
    }

    /// Select the output resolution tier
    pub fn set_resolution(&mut self, resolution: ResolutionTier) {
        self.resolution = resolution;
        self.publish();
    }

    /// Set the Composite ownership confirmation
    pub fn set_ownership_verified(&mut self, verified: bool) {
        self.ownership_verified = verified;
        self.publish();
    }

    /// Whether a submit would currently be accepted
    pub fn can_submit(&self) -> bool {
        if self.status == SessionStatus::Generating {
            return false;
        }
        if self.mode.requires_directive() && self.directive.trim().is_empty() {
            return false;
        }
        if self.mode.requires_primary() && self.primary.is_none() {
            return false;
        }
        if self.mode.requires_reference() && (self.reference.is_none() || !self.ownership_verified)
        {
            return false;
        }
        true
    }

    /// Enter Generating and build the request for the current mode
    pub fn begin_submit(&mut self) -> Result<RequestDescriptor, StudioError> {
        if !self.can_submit() {
            return Err(StudioError::InvalidState(self.submit_blocker()));
        }

        let request = RequestDescriptor {
            mode: self.mode,
            primary: self.primary.clone(),
            reference: self.reference.clone(),
            directive: self.directive.clone(),
            aspect_ratio: self.aspect_ratio,
            resolution: self.resolution,
            ownership_verified: self.ownership_verified,
        };

        self.status = SessionStatus::Generating;
        self.status_message = self.mode.progress_phrase().to_string();
        self.result = None;
        self.error = None;
        info!(mode = %self.mode, "Submit started");
        self.publish();

        Ok(request)
    }

    /// Record a successful outcome
    pub fn complete_success(&mut self, artifact: ResultArtifact) -> Result<(), StudioError> {
        self.ensure_generating("complete_success")?;
        info!(mode = %self.mode, kind = ?artifact.kind(), "Submit succeeded");
        self.status = SessionStatus::Success;
        self.status_message = STATUS_DONE.to_string();
        self.result = Some(artifact);
        self.error = None;
        self.publish();
        Ok(())
    }

    /// Record a failed outcome
    pub fn complete_failure(&mut self, error: &StudioError) -> Result<(), StudioError> {
        self.ensure_generating("complete_failure")?;
        info!(mode = %self.mode, error = %error, "Submit failed");
        self.status = SessionStatus::Error;
        self.status_message = STATUS_FAILED.to_string();
        self.result = None;
        self.error = Some(error.to_string());
        self.publish();
        Ok(())
    }

    /// Apply inputs derived from a previous result and switch to `target`
    pub fn apply_chain(&mut self, target: Mode, seed: ChainSeed) -> Result<(), StudioError> {
        if self.status == SessionStatus::Generating {
            return Err(StudioError::InvalidState(
                "Cannot chain while a job is running".to_string(),
            ));
        }

        match seed {
            ChainSeed::Image(asset) => {
                self.primary = Some(asset);
                self.reference = None;
                self.directive.clear();
            }
            ChainSeed::Text(text) => {
                self.directive = text;
            }
        }

        info!(from = %self.mode, to = %target, "Chained result into new mode");
        self.mode = target;
        self.reset_outcome();
        self.publish();
        Ok(())
    }

    /// Current read-only view
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            mode: self.mode,
            status: self.status,
            status_message: self.status_message.clone(),
            result: self.result.clone(),
            error: self.error.clone(),
            directive: self.directive.clone(),
            primary: self.primary.as_ref().map(InputAsset::summary),
            reference: self.reference.as_ref().map(InputAsset::summary),
            aspect_ratio: self.aspect_ratio,
            resolution: self.resolution,
            ownership_verified: self.ownership_verified,
            can_submit: self.can_submit(),
        }
    }

    fn reset_outcome(&mut self) {
        self.status = SessionStatus::Idle;
        self.status_message = STATUS_READY.to_string();
        self.result = None;
        self.error = None;
    }

    fn ensure_generating(&self, operation: &str) -> Result<(), StudioError> {
        if self.status != SessionStatus::Generating {
            return Err(StudioError::InvalidState(format!(
                "{} called while session is {:?}",
                operation, self.status
            )));
        }
        Ok(())
    }

    fn submit_blocker(&self) -> String {
        if self.status == SessionStatus::Generating {
            return "A job is already running".to_string();
        }
        if self.mode.requires_directive() && self.directive.trim().is_empty() {
            return format!("{} requires a prompt", self.mode);
        }
        if self.mode.requires_primary() && self.primary.is_none() {
            return format!("{} requires a primary image", self.mode);
        }
        if self.mode.requires_reference() && self.reference.is_none() {
            return format!("{} requires a reference image", self.mode);
        }
        format!("{} requires ownership confirmation", self.mode)
    }

    fn publish(&mut self) {
        let snapshot = self.snapshot();
        self.updates.send_replace(snapshot);
    }
}

impl SessionSnapshot {
    fn placeholder(mode: Mode) -> Self {
        Self {
            mode,
            status: SessionStatus::Idle,
            status_message: STATUS_READY.to_string(),
            result: None,
            error: None,
            directive: String::new(),
            primary: None,
            reference: None,
            aspect_ratio: AspectRatio::default(),
            resolution: ResolutionTier::default(),
            ownership_verified: false,
            can_submit: false,
        }
    }
}
