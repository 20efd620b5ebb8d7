//! Narration
//!
//! Synthesizes speech for text results and hands the decoded buffer to an
//! audio sink. At most one narration is active at a time; a second request
//! while one is playing is skipped rather than rejected.

use crate::studio::codec::{decode_pcm16, AudioBuffer};
use crate::studio::error::StudioError;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, oneshot};
use tracing::{debug, info, warn};

/// Produces raw PCM16LE 24 kHz mono speech for a text
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text`
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, StudioError>;
}

/// Plays a decoded buffer; resolves once playback has fully completed
#[async_trait]
pub trait AudioSink: Send + Sync {
    /// Play `buffer`
    async fn play(&self, buffer: AudioBuffer) -> Result<(), StudioError>;
}

/// Outcome of a speak request
#[derive(Debug)]
pub enum SpeakOutcome {
    /// Playback started; `completion` resolves when it ends
    Started {
        /// Playback length in milliseconds
        duration_ms: u64,
        /// Fires once playback finished and the guard was released
        completion: oneshot::Receiver<()>,
    },
    /// Another narration was already playing
    Skipped,
}

/// Single-flight narration driver
pub struct Narrator {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    sink: Arc<dyn AudioSink>,
    busy: Arc<AtomicBool>,
}

impl Narrator {
    /// Create a narrator
    pub fn new(synthesizer: Arc<dyn SpeechSynthesizer>, sink: Arc<dyn AudioSink>) -> Self {
        Self {
            synthesizer,
            sink,
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Whether a narration is currently active
    pub fn is_speaking(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Narrate `text`
    ///
    /// Returns once the buffer has been decoded and playback has started.
    /// Synthesis and decode failures release the guard before returning.
    pub async fn speak(&self, text: &str) -> Result<SpeakOutcome, StudioError> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Narration already active, skipping");
            return Ok(SpeakOutcome::Skipped);
        }
        let guard = PlaybackGuard(self.busy.clone());

        let pcm = self.synthesizer.synthesize(text).await?;
        let buffer = decode_pcm16(&pcm)?;
        let duration_ms = buffer.duration().as_millis() as u64;

        info!(
            text_len = text.len(),
            samples = buffer.samples.len(),
            duration_ms,
            "Starting narration"
        );

        let (done_tx, done_rx) = oneshot::channel();
        let sink = self.sink.clone();
        tokio::spawn(async move {
            if let Err(e) = sink.play(buffer).await {
                warn!(error = %e, "Audio playback failed");
            }
            drop(guard);
            let _ = done_tx.send(());
        });

        Ok(SpeakOutcome::Started {
            duration_ms,
            completion: done_rx,
        })
    }
}

// Releases the single-flight flag exactly once, when dropped.
struct PlaybackGuard(Arc<AtomicBool>);

impl Drop for PlaybackGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Sink that fans buffers out to subscribers and holds for the playback length
///
/// Used by the server: connected clients play the buffer, and the narrator
/// stays busy for as long as that playback takes.
#[derive(Debug, Clone)]
pub struct BroadcastSink {
    tx: broadcast::Sender<Arc<AudioBuffer>>,
}

impl BroadcastSink {
    /// Create a sink with room for `capacity` queued buffers per subscriber
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to narrated buffers
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<AudioBuffer>> {
        self.tx.subscribe()
    }
}

#[async_trait]
impl AudioSink for BroadcastSink {
    async fn play(&self, buffer: AudioBuffer) -> Result<(), StudioError> {
        let duration = buffer.duration();
        let listeners = self.tx.send(Arc::new(buffer)).unwrap_or(0);
        debug!(listeners, duration_ms = duration.as_millis() as u64, "Broadcast audio");
        tokio::time::sleep(duration).await;
        Ok(())
    }
}
