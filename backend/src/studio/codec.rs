//! Media codec
//!
//! Decodes synthesized PCM into playable sample buffers and turns generated
//! image locators back into input assets.

use crate::studio::constants::{SPEECH_CHANNELS, SPEECH_SAMPLE_RATE};
use crate::studio::error::StudioError;
use crate::studio::media::MediaStore;
use crate::studio::types::{InputAsset, MediaLocator};
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use serde::Serialize;
use std::time::Duration;

/// Decoded, playable audio
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AudioBuffer {
    /// Samples per second
    pub sample_rate: u32,
    /// Interleaved channel count
    pub channels: u16,
    /// Samples normalized to [-1.0, 1.0)
    pub samples: Vec<f32>,
}

impl AudioBuffer {
    /// Playback length of the buffer
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 || self.channels == 0 {
            return Duration::ZERO;
        }
        let frames = self.samples.len() as f64 / self.channels as f64;
        Duration::from_secs_f64(frames / self.sample_rate as f64)
    }
}

/// Decode 16-bit little-endian mono PCM at 24 kHz into a playback buffer
///
/// Each sample is divided by 32768, so `i16::MIN` maps to exactly -1.0.
pub fn decode_pcm16(pcm: &[u8]) -> Result<AudioBuffer, StudioError> {
    if pcm.len() % 2 != 0 {
        return Err(StudioError::Decode(format!(
            "PCM payload has odd length {}",
            pcm.len()
        )));
    }

    let samples = pcm
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / 32768.0)
        .collect();

    Ok(AudioBuffer {
        sample_rate: SPEECH_SAMPLE_RATE,
        channels: SPEECH_CHANNELS,
        samples,
    })
}

/// Fetch the bytes behind an image locator and wrap them as a new input asset
///
/// Store locators are looked up in `media`; `data:` URLs are decoded in place.
/// `default_mime` is used when the source carries no MIME type.
pub async fn reingest_image(
    media: &MediaStore,
    locator: &MediaLocator,
    default_mime: &str,
) -> Result<InputAsset, StudioError> {
    if let Some(rest) = locator.as_str().strip_prefix("data:") {
        let (mime, data) = parse_data_url(rest)?;
        let mime = if mime.is_empty() { default_mime } else { mime };
        return Ok(InputAsset::new(data, mime, locator.as_str()));
    }

    let stored = media.resolve(locator).await.ok_or_else(|| {
        StudioError::Chain(format!("Media not found for locator {}", locator))
    })?;

    let mime = if stored.mime_type.is_empty() {
        default_mime.to_string()
    } else {
        stored.mime_type
    };

    Ok(InputAsset::new(stored.data, mime, locator.as_str()))
}

// `rest` is everything after "data:", e.g. "image/png;base64,iVBOR..."
fn parse_data_url(rest: &str) -> Result<(&str, Vec<u8>), StudioError> {
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| StudioError::Chain("Malformed data URL".to_string()))?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or_else(|| StudioError::Chain("Only base64 data URLs are supported".to_string()))?;
    let data = BASE64_STANDARD
        .decode(payload)
        .map_err(|e| StudioError::Chain(format!("Failed to decode data URL: {}", e)))?;
    Ok((mime, data))
}
