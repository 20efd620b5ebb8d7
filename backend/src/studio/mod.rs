//! Generation studio engine
//!
//! Session state machine, job polling, result chaining, media handling and
//! narration. Providers plug in through [`crate::provider::ProviderAdapter`].

pub mod chainer;
pub mod codec;
pub mod config;
pub mod constants;
pub mod controller;
pub mod error;
pub mod media;
pub mod narrator;
pub mod orchestrator;
pub mod poller;
pub mod types;

pub use chainer::{derive_seed, ChainSeed};
pub use codec::{decode_pcm16, reingest_image, AudioBuffer};
pub use config::StudioConfig;
pub use controller::ModeController;
pub use error::StudioError;
pub use media::{MediaStore, StoredMedia};
pub use narrator::{AudioSink, BroadcastSink, Narrator, SpeakOutcome, SpeechSynthesizer};
pub use orchestrator::Orchestrator;
pub use poller::JobPoller;
pub use types::{
    ArtifactKind, AspectRatio, AssetSlot, AssetSummary, InputAsset, JobHandle, JobOutcome,
    MediaLocator, Mode, RequestDescriptor, ResolutionTier, ResultArtifact, SessionSnapshot,
    SessionStatus,
};
