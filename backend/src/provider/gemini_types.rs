//! Gemini API wire types
//!
//! Structs that mirror the Gemini REST JSON format for content generation,
//! long-running video jobs and speech synthesis.

use serde::{Deserialize, Serialize};

/// Request body for `models/{model}:generateContent`
#[derive(Serialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    /// Conversation turns (a single user turn here)
    pub contents: Vec<Content>,
    /// Optional generation configuration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
    /// Optional tools (e.g. search grounding)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Tool>>,
}

impl GenerateContentRequest {
    /// A request with one user turn made of `parts`
    pub fn user(parts: Vec<Part>) -> Self {
        Self {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts,
            }],
            ..Default::default()
        }
    }
}

/// One turn of content
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct Content {
    /// Author role ("user" or "model")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Content parts
    #[serde(default)]
    pub parts: Vec<Part>,
}

/// A single part: text or inline binary data
#[derive(Serialize, Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    /// Text content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Inline base64 payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineData>,
}

impl Part {
    /// A text part
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }

    /// An inline data part
    pub fn inline(mime_type: impl Into<String>, data_base64: String) -> Self {
        Self {
            text: None,
            inline_data: Some(InlineData {
                mime_type: mime_type.into(),
                data: data_base64,
            }),
        }
    }
}

/// Base64 payload with its MIME type
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    /// MIME type of the payload
    #[serde(default)]
    pub mime_type: String,
    /// Base64-encoded bytes
    pub data: String,
}

/// Generation configuration
#[derive(Serialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    /// Requested output modalities, e.g. `["IMAGE"]` or `["AUDIO"]`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_modalities: Option<Vec<String>>,
    /// Image output settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_config: Option<ImageConfig>,
    /// Speech output settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speech_config: Option<SpeechConfig>,
}

/// Image output settings
#[derive(Serialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ImageConfig {
    /// Aspect ratio, e.g. "16:9"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<String>,
    /// Size tier, e.g. "2K"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_size: Option<String>,
}

/// Speech output settings
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SpeechConfig {
    /// Voice selection
    pub voice_config: VoiceConfig,
}

/// Voice selection
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct VoiceConfig {
    /// Prebuilt voice
    pub prebuilt_voice_config: PrebuiltVoiceConfig,
}

/// Prebuilt voice by name
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PrebuiltVoiceConfig {
    /// Voice name, e.g. "Kore"
    pub voice_name: String,
}

/// Tool declaration
#[derive(Serialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    /// Google Search grounding
    #[serde(skip_serializing_if = "Option::is_none")]
    pub google_search: Option<GoogleSearch>,
}

/// Empty marker enabling Google Search grounding
#[derive(Serialize, Debug, Default)]
pub struct GoogleSearch {}

/// Response body of `generateContent`
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    /// Candidate responses
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    /// Feedback about the prompt (e.g. if it was blocked)
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
}

impl GenerateContentResponse {
    /// Parts of the first candidate
    pub fn first_parts(&self) -> &[Part] {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| c.parts.as_slice())
            .unwrap_or(&[])
    }

    /// First inline payload of the first candidate
    pub fn first_inline_data(&self) -> Option<&InlineData> {
        self.first_parts()
            .iter()
            .find_map(|p| p.inline_data.as_ref())
    }

    /// Concatenated text of the first candidate
    pub fn text(&self) -> String {
        self.first_parts()
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect::<Vec<_>>()
            .join("")
    }
}

/// A single candidate
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// Candidate content
    #[serde(default)]
    pub content: Option<Content>,
    /// Why the model stopped generating
    #[serde(default)]
    pub finish_reason: Option<String>,
    /// Search grounding details
    #[serde(default)]
    pub grounding_metadata: Option<GroundingMetadata>,
}

/// Search grounding details
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct GroundingMetadata {
    /// Sources used for grounding
    #[serde(default)]
    pub grounding_chunks: Vec<GroundingChunk>,
}

/// One grounding source
#[derive(Deserialize, Debug, Default)]
pub struct GroundingChunk {
    /// Web source, when the chunk came from search
    #[serde(default)]
    pub web: Option<WebSource>,
}

/// Web page used for grounding
#[derive(Deserialize, Debug, Default, Clone)]
pub struct WebSource {
    /// Page URL
    #[serde(default)]
    pub uri: String,
    /// Page title
    #[serde(default)]
    pub title: Option<String>,
}

/// Feedback about the prompt
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    /// Reason the prompt was blocked, if it was
    #[serde(default)]
    pub block_reason: Option<String>,
}

/// Request body for `models/{model}:predictLongRunning`
#[derive(Serialize, Debug)]
pub struct PredictLongRunningRequest {
    /// Video generation instances (one here)
    pub instances: Vec<VideoInstance>,
    /// Generation parameters
    pub parameters: VideoParameters,
}

/// A single video generation instance
#[derive(Serialize, Debug)]
pub struct VideoInstance {
    /// Motion prompt
    pub prompt: String,
    /// Starting frame
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<VideoImage>,
}

/// Starting frame for video generation
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct VideoImage {
    /// Base64-encoded image bytes
    pub bytes_base64_encoded: String,
    /// Image MIME type
    pub mime_type: String,
}

/// Video generation parameters
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct VideoParameters {
    /// "16:9" or "9:16"
    pub aspect_ratio: String,
    /// Number of videos to generate
    pub sample_count: u32,
}

/// Long-running operation as returned by submit and status calls
#[derive(Deserialize, Debug, Default)]
pub struct Operation {
    /// Operation name, e.g. `models/veo/operations/abc`
    #[serde(default)]
    pub name: String,
    /// Whether the operation finished
    #[serde(default)]
    pub done: bool,
    /// Result payload once done
    #[serde(default)]
    pub response: Option<OperationResponse>,
    /// Failure details once done
    #[serde(default)]
    pub error: Option<OperationError>,
}

impl Operation {
    /// URI of the first generated video, if any
    pub fn video_uri(&self) -> Option<&str> {
        self.response
            .as_ref()?
            .generate_video_response
            .as_ref()?
            .generated_samples
            .first()?
            .video
            .as_ref()
            .map(|v| v.uri.as_str())
            .filter(|uri| !uri.is_empty())
    }
}

/// Finished operation payload
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct OperationResponse {
    /// Video generation result
    #[serde(default)]
    pub generate_video_response: Option<GenerateVideoResponse>,
}

/// Video generation result
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct GenerateVideoResponse {
    /// Generated samples
    #[serde(default)]
    pub generated_samples: Vec<GeneratedSample>,
}

/// One generated video
#[derive(Deserialize, Debug, Default)]
pub struct GeneratedSample {
    /// Video reference
    #[serde(default)]
    pub video: Option<VideoRef>,
}

/// Downloadable video reference
#[derive(Deserialize, Debug, Default)]
pub struct VideoRef {
    /// Download URI
    #[serde(default)]
    pub uri: String,
}

/// Failure details of an operation
#[derive(Deserialize, Debug, Default)]
pub struct OperationError {
    /// Status code
    #[serde(default)]
    pub code: Option<i32>,
    /// Human-readable message
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serializes_camel_case() {
        let mut request = GenerateContentRequest::user(vec![
            Part::inline("image/png", "AAAA".to_string()),
            Part::text("make it blue"),
        ]);
        request.generation_config = Some(GenerationConfig {
            response_modalities: Some(vec!["IMAGE".to_string()]),
            image_config: Some(ImageConfig {
                aspect_ratio: Some("1:1".to_string()),
                image_size: Some("2K".to_string()),
            }),
            speech_config: None,
        });

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["inlineData"]["mimeType"], "image/png");
        assert_eq!(json["contents"][0]["parts"][1]["text"], "make it blue");
        assert_eq!(json["generationConfig"]["imageConfig"]["imageSize"], "2K");
        assert!(json["generationConfig"].get("speechConfig").is_none());
        assert!(json.get("tools").is_none());
    }

    #[test]
    fn test_response_helpers() {
        let response: GenerateContentResponse = serde_json::from_str(
            r#"{
                "candidates": [{
                    "content": {
                        "role": "model",
                        "parts": [
                            {"text": "Here you go. "},
                            {"inlineData": {"mimeType": "image/png", "data": "iVBO"}},
                            {"text": "Enjoy."}
                        ]
                    },
                    "finishReason": "STOP"
                }]
            }"#,
        )
        .unwrap();

        assert_eq!(response.text(), "Here you go. Enjoy.");
        assert_eq!(response.first_inline_data().unwrap().data, "iVBO");
    }

    #[test]
    fn test_empty_response_helpers() {
        let response: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert!(response.first_inline_data().is_none());
        assert_eq!(response.text(), "");
    }

    #[test]
    fn test_operation_video_uri() {
        let op: Operation = serde_json::from_str(
            r#"{
                "name": "models/veo/operations/1",
                "done": true,
                "response": {
                    "generateVideoResponse": {
                        "generatedSamples": [{"video": {"uri": "https://files/v.mp4"}}]
                    }
                }
            }"#,
        )
        .unwrap();
        assert!(op.done);
        assert_eq!(op.video_uri(), Some("https://files/v.mp4"));

        let pending: Operation = serde_json::from_str(r#"{"name": "op"}"#).unwrap();
        assert!(!pending.done);
        assert_eq!(pending.video_uri(), None);
    }
}
