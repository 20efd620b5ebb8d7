//! Orchestrator
//!
//! Composes the engine: validates a submit through the [`ModeController`],
//! dispatches to the adapter registered for the mode, and reports the outcome
//! back. Every provider failure is converted into `complete_failure` here;
//! nothing is retried.

use crate::history::HistoryDb;
use crate::provider::AdapterSet;
use crate::studio::chainer::derive_seed;
use crate::studio::controller::ModeController;
use crate::studio::error::StudioError;
use crate::studio::media::MediaStore;
use crate::studio::narrator::{Narrator, SpeakOutcome};
use crate::studio::types::{
    AspectRatio, AssetSlot, InputAsset, MediaLocator, Mode, RequestDescriptor, ResolutionTier,
    ResultArtifact, SessionSnapshot, SessionStatus,
};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio::sync::{watch, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Drives one generation session
pub struct Orchestrator {
    controller: Arc<RwLock<ModeController>>,
    adapters: AdapterSet,
    media: Arc<MediaStore>,
    history: Option<Arc<HistoryDb>>,
    narrator: Option<Narrator>,
    in_flight: Mutex<Option<CancellationToken>>,
    updates: watch::Receiver<SessionSnapshot>,
}

impl Orchestrator {
    /// Create an orchestrator around `controller`
    pub fn new(controller: ModeController, adapters: AdapterSet, media: Arc<MediaStore>) -> Self {
        let updates = controller.subscribe();
        Self {
            controller: Arc::new(RwLock::new(controller)),
            adapters,
            media,
            history: None,
            narrator: None,
            in_flight: Mutex::new(None),
            updates,
        }
    }

    /// Record successful directives in `history`
    pub fn with_history(mut self, history: Arc<HistoryDb>) -> Self {
        self.history = Some(history);
        self
    }

    /// Enable narration of text results
    pub fn with_narrator(mut self, narrator: Narrator) -> Self {
        self.narrator = Some(narrator);
        self
    }

    /// Media store backing result and input locators
    pub fn media(&self) -> &Arc<MediaStore> {
        &self.media
    }

    /// History store, if configured
    pub fn history(&self) -> Option<&Arc<HistoryDb>> {
        self.history.as_ref()
    }

    /// Current session view
    pub async fn snapshot(&self) -> SessionSnapshot {
        self.controller.read().await.snapshot()
    }

    /// Receive every published snapshot
    ///
    /// Does not take the session lock, so it stays usable while a job runs.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.updates.clone()
    }

    /// Switch mode; refused while a job is running
    pub async fn set_mode(&self, mode: Mode) -> Result<SessionSnapshot, StudioError> {
        let mut controller = self.controller.write().await;
        let before = controller.media_refs();
        controller.set_mode(mode)?;
        self.release_media(before, &controller).await;
        Ok(controller.snapshot())
    }

    /// Replace the directive text
    pub async fn set_directive(&self, directive: impl Into<String>) -> SessionSnapshot {
        let mut controller = self.controller.write().await;
        controller.set_directive(directive);
        controller.snapshot()
    }

    /// Store an input asset in `slot`
    pub async fn set_asset(&self, slot: AssetSlot, asset: InputAsset) -> SessionSnapshot {
        let mut controller = self.controller.write().await;
        let before = controller.media_refs();
        controller.set_asset(slot, asset);
        self.release_media(before, &controller).await;
        controller.snapshot()
    }

    /// Remove the input asset in `slot`
    pub async fn clear_asset(&self, slot: AssetSlot) -> SessionSnapshot {
        let mut controller = self.controller.write().await;
        let before = controller.media_refs();
        controller.clear_asset(slot);
        self.release_media(before, &controller).await;
        controller.snapshot()
    }

    /// Update output settings; `None` leaves a setting unchanged
    pub async fn update_settings(
        &self,
        aspect_ratio: Option<AspectRatio>,
        resolution: Option<ResolutionTier>,
        ownership_verified: Option<bool>,
    ) -> SessionSnapshot {
        let mut controller = self.controller.write().await;
        if let Some(aspect_ratio) = aspect_ratio {
            controller.set_aspect_ratio(aspect_ratio);
        }
        if let Some(resolution) = resolution {
            controller.set_resolution(resolution);
        }
        if let Some(verified) = ownership_verified {
            controller.set_ownership_verified(verified);
        }
        controller.snapshot()
    }

    /// Run a submit to completion
    ///
    /// Returns `InvalidState` if the session does not allow a submit. Provider
    /// failures are not returned: they land in the snapshot as `Error`.
    pub async fn submit(&self) -> Result<SessionSnapshot, StudioError> {
        let (request, cancel) = self.begin().await?;
        Ok(self.run(request, cancel).await)
    }

    /// Start a submit in the background
    ///
    /// Validation happens before returning, so the returned snapshot is
    /// already `Generating`.
    pub async fn spawn_submit(self: &Arc<Self>) -> Result<SessionSnapshot, StudioError> {
        let (request, cancel) = self.begin().await?;
        let snapshot = self.snapshot().await;

        let this = Arc::clone(self);
        tokio::spawn(async move {
            this.run(request, cancel).await;
        });

        Ok(snapshot)
    }

    /// Cancel the in-flight job
    ///
    /// Returns `false` when nothing is running or when the running adapter
    /// cannot be interrupted; such a job still runs to completion.
    pub fn cancel(&self) -> bool {
        match self.lock_in_flight().as_ref() {
            Some(token) => {
                info!("Cancelling in-flight job");
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Feed the current result into `target` mode
    ///
    /// On failure the session is left exactly as it was.
    pub async fn chain(&self, target: Mode) -> Result<SessionSnapshot, StudioError> {
        let mut controller = self.controller.write().await;
        if controller.status() == SessionStatus::Generating {
            return Err(StudioError::InvalidState(
                "Cannot chain while a job is running".to_string(),
            ));
        }
        let artifact = controller
            .result()
            .cloned()
            .ok_or_else(|| StudioError::InvalidState("There is no result to chain".to_string()))?;

        let seed = derive_seed(&artifact, &self.media).await?;
        let before = controller.media_refs();
        controller.apply_chain(target, seed)?;
        self.release_media(before, &controller).await;
        Ok(controller.snapshot())
    }

    /// Narrate `text`, or the current text result when `text` is `None`
    pub async fn speak(&self, text: Option<String>) -> Result<SpeakOutcome, StudioError> {
        let narrator = self
            .narrator
            .as_ref()
            .ok_or_else(|| StudioError::provider("Narration is not configured"))?;

        let text = match text {
            Some(text) => text,
            None => match self.controller.read().await.result() {
                Some(ResultArtifact::Text { content }) => content.clone(),
                _ => {
                    return Err(StudioError::InvalidState(
                        "There is no text result to narrate".to_string(),
                    ))
                }
            },
        };

        narrator.speak(&text).await
    }

    async fn begin(&self) -> Result<(RequestDescriptor, CancellationToken), StudioError> {
        let request = {
            let mut controller = self.controller.write().await;
            let before = controller.media_refs();
            let request = controller.begin_submit()?;
            self.release_media(before, &controller).await;
            request
        };

        let cancel = CancellationToken::new();
        let cancellable = self
            .adapters
            .get(request.mode)
            .map(|adapter| adapter.cancellable())
            .unwrap_or(false);
        if cancellable {
            *self.lock_in_flight() = Some(cancel.clone());
        }
        Ok((request, cancel))
    }

    async fn run(&self, request: RequestDescriptor, cancel: CancellationToken) -> SessionSnapshot {
        let mode = request.mode;
        let outcome = match self.adapters.get(mode) {
            Ok(adapter) => adapter.invoke(&request, &cancel).await,
            Err(e) => Err(e),
        };
        self.lock_in_flight().take();

        let succeeded = outcome.is_ok();
        let snapshot = {
            let mut controller = self.controller.write().await;
            let before = controller.media_refs();
            let reported = match outcome {
                Ok(artifact) => controller.complete_success(artifact),
                Err(e) => {
                    warn!(mode = %mode, error = %e, "Provider call failed");
                    controller.complete_failure(&e)
                }
            };
            if let Err(e) = reported {
                warn!(mode = %mode, error = %e, "Could not report job outcome");
            }
            self.release_media(before, &controller).await;
            controller.snapshot()
        };

        if succeeded {
            self.record_history(&request.directive).await;
        }

        snapshot
    }

    async fn record_history(&self, directive: &str) {
        let Some(history) = &self.history else {
            return;
        };
        if directive.trim().is_empty() {
            return;
        }
        match history.record(directive).await {
            Ok(Some(entry)) => debug!(id = %entry.id, "History entry recorded"),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Failed to record history"),
        }
    }

    /// Drop blobs the session referenced in `before` but no longer does
    async fn release_media(&self, before: HashSet<MediaLocator>, controller: &ModeController) {
        let after = controller.media_refs();
        for locator in before.difference(&after) {
            if self.media.remove(locator).await {
                debug!(locator = %locator, "Released media");
            }
        }
    }

    fn lock_in_flight(&self) -> std::sync::MutexGuard<'_, Option<CancellationToken>> {
        self.in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
