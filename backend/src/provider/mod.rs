//! Provider module
//!
//! Adapters that wrap the external generation capabilities behind
//! [`ProviderAdapter`], plus the Gemini HTTP client they share.

pub mod adapters;
pub mod api_client;
pub mod gemini_types;
pub mod speech;

pub use adapters::{AdapterSet, ProviderAdapter};
pub use api_client::GeminiClient;
pub use speech::SpeechAdapter;
