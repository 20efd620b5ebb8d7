//! Speech adapter
//!
//! Turns text into raw PCM16LE 24 kHz mono audio via a Gemini TTS model.

use crate::provider::api_client::GeminiClient;
use crate::provider::gemini_types::{
    GenerateContentRequest, GenerationConfig, Part, PrebuiltVoiceConfig, SpeechConfig,
    VoiceConfig,
};
use crate::studio::{SpeechSynthesizer, StudioError};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use std::sync::Arc;
use tracing::debug;

/// Gemini text-to-speech
pub struct SpeechAdapter {
    client: Arc<GeminiClient>,
    model: String,
    voice: String,
}

impl SpeechAdapter {
    /// Create a speech adapter using `model` and the prebuilt `voice`
    pub fn new(client: Arc<GeminiClient>, model: impl Into<String>, voice: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            voice: voice.into(),
        }
    }

    fn request(&self, text: &str) -> GenerateContentRequest {
        let mut request = GenerateContentRequest::user(vec![Part::text(text)]);
        request.generation_config = Some(GenerationConfig {
            response_modalities: Some(vec!["AUDIO".to_string()]),
            image_config: None,
            speech_config: Some(SpeechConfig {
                voice_config: VoiceConfig {
                    prebuilt_voice_config: PrebuiltVoiceConfig {
                        voice_name: self.voice.clone(),
                    },
                },
            }),
        });
        request
    }
}

#[async_trait]
impl SpeechSynthesizer for SpeechAdapter {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, StudioError> {
        if text.trim().is_empty() {
            return Err(StudioError::provider("Nothing to narrate"));
        }

        let response = self
            .client
            .generate_content(&self.model, &self.request(text))
            .await?;

        let inline = response
            .first_inline_data()
            .ok_or_else(|| StudioError::provider("No audio was returned"))?;

        let pcm = BASE64_STANDARD
            .decode(&inline.data)
            .map_err(|e| StudioError::Decode(format!("Failed to decode audio data: {}", e)))?;

        if pcm.is_empty() {
            return Err(StudioError::provider("No audio was returned"));
        }

        debug!(bytes = pcm.len(), mime_type = %inline.mime_type, "Received speech audio");
        Ok(pcm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::api_client::API_KEY_HEADER;
    use mockito::{Matcher, Server};
    use serde_json::json;
    use serial_test::serial;

    #[tokio::test]
    #[serial]
    async fn test_synthesize_returns_pcm() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/models/tts:generateContent")
            .match_header(API_KEY_HEADER, "test-key")
            .match_body(Matcher::PartialJson(json!({
                "generationConfig": {
                    "responseModalities": ["AUDIO"],
                    "speechConfig": {"voiceConfig": {"prebuiltVoiceConfig": {"voiceName": "Kore"}}}
                }
            })))
            .with_status(200)
            .with_body(
                json!({
                    "candidates": [{"content": {"parts": [{
                        "inlineData": {
                            "mimeType": "audio/L16;codec=pcm;rate=24000",
                            "data": BASE64_STANDARD.encode([0x00u8, 0x80, 0x00, 0x00])
                        }
                    }]}}]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = Arc::new(GeminiClient::new(reqwest::Client::new(), "test-key", server.url()));
        let adapter = SpeechAdapter::new(client, "tts", "Kore");
        let pcm = adapter.synthesize("Hello there").await.unwrap();

        mock.assert_async().await;
        assert_eq!(pcm, vec![0x00, 0x80, 0x00, 0x00]);
    }

    #[tokio::test]
    #[serial]
    async fn test_synthesize_without_audio_part() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/models/tts:generateContent")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"candidates": [{"content": {"parts": [{"text": "sorry"}]}}]}"#)
            .create_async()
            .await;

        let client = Arc::new(GeminiClient::new(reqwest::Client::new(), "test-key", server.url()));
        let adapter = SpeechAdapter::new(client, "tts", "Kore");
        let err = adapter.synthesize("Hello").await.unwrap_err();

        mock.assert_async().await;
        assert_eq!(err, StudioError::provider("No audio was returned"));
    }

    #[tokio::test]
    async fn test_synthesize_empty_text() {
        let client = Arc::new(GeminiClient::new(reqwest::Client::new(), "test-key", "http://127.0.0.1:9"));
        let adapter = SpeechAdapter::new(client, "tts", "Kore");
        assert!(adapter.synthesize("  ").await.is_err());
    }
}
