//! Integration tests for provider request shaping
//!
//! Each adapter is run against a mock Gemini server and the outgoing body is
//! checked against the call contract for its mode.

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use media_studio_backend::provider::adapters::{
    AnalyzeAdapter, AnimateAdapter, CompositeAdapter, CulinaryAdapter, EditAdapter,
    GenerateAdapter, ReasonAdapter,
};
use media_studio_backend::provider::api_client::API_KEY_HEADER;
use media_studio_backend::provider::{GeminiClient, ProviderAdapter};
use media_studio_backend::studio::{
    AspectRatio, InputAsset, JobPoller, MediaStore, Mode, RequestDescriptor, ResolutionTier,
    ResultArtifact, StudioError,
};
use mockito::{Matcher, Server, ServerGuard};
use serde_json::json;
use serial_test::serial;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const PNG_BYTES: &[u8] = &[0x89, 0x50, 0x4e, 0x47];

fn client(server: &ServerGuard) -> Arc<GeminiClient> {
    Arc::new(GeminiClient::new(
        reqwest::Client::new(),
        "test-key",
        server.url(),
    ))
}

fn photo() -> InputAsset {
    InputAsset::new(vec![1, 2, 3, 4], "image/jpeg", "photo.jpg")
}

fn request(mode: Mode) -> RequestDescriptor {
    RequestDescriptor {
        mode,
        primary: None,
        reference: None,
        directive: String::new(),
        aspect_ratio: AspectRatio::default(),
        resolution: ResolutionTier::default(),
        ownership_verified: false,
    }
}

fn image_response() -> String {
    json!({
        "candidates": [{
            "content": {
                "parts": [
                    {"text": "here you go"},
                    {"inlineData": {"mimeType": "image/png", "data": BASE64_STANDARD.encode(PNG_BYTES)}}
                ]
            }
        }]
    })
    .to_string()
}

fn text_response(text: &str) -> String {
    json!({"candidates": [{"content": {"parts": [{"text": text}]}}]}).to_string()
}

async fn assert_stored_png(media: &MediaStore, artifact: &ResultArtifact) {
    match artifact {
        ResultArtifact::Image { locator, mime_type } => {
            assert_eq!(mime_type, "image/png");
            let stored = media.resolve(locator).await.expect("image should be stored");
            assert_eq!(stored.data, PNG_BYTES);
        }
        other => panic!("expected image artifact, got {:?}", other),
    }
}

#[tokio::test]
#[serial]
async fn test_generate_sends_user_settings() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/models/image-model:generateContent")
        .match_header(API_KEY_HEADER, "test-key")
        .match_body(Matcher::PartialJson(json!({
            "contents": [{"parts": [{"text": "a lighthouse at dusk"}]}],
            "generationConfig": {
                "responseModalities": ["IMAGE"],
                "imageConfig": {"aspectRatio": "3:4", "imageSize": "4K"}
            }
        })))
        .with_status(200)
        .with_body(image_response())
        .create_async()
        .await;

    let media = Arc::new(MediaStore::new());
    let adapter = GenerateAdapter {
        client: client(&server),
        media: media.clone(),
        model: "image-model".to_string(),
    };
    let mut req = request(Mode::Generate);
    req.directive = "a lighthouse at dusk".to_string();
    req.aspect_ratio = AspectRatio::Portrait3x4;
    req.resolution = ResolutionTier::High;

    let artifact = adapter
        .invoke(&req, &CancellationToken::new())
        .await
        .unwrap();

    mock.assert_async().await;
    assert_stored_png(&media, &artifact).await;
}

#[tokio::test]
#[serial]
async fn test_composite_forces_square_mid_tier() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/models/image-model:generateContent")
        .match_query(Matcher::Any)
        .match_body(Matcher::PartialJson(json!({
            "generationConfig": {
                "responseModalities": ["IMAGE"],
                "imageConfig": {"aspectRatio": "1:1", "imageSize": "2K"}
            }
        })))
        .with_status(200)
        .with_body(image_response())
        .create_async()
        .await;

    let media = Arc::new(MediaStore::new());
    let adapter = CompositeAdapter {
        client: client(&server),
        media: media.clone(),
        model: "image-model".to_string(),
    };
    let mut req = request(Mode::Composite);
    req.primary = Some(photo());
    req.reference = Some(InputAsset::new(vec![5, 6], "image/png", "me.png"));
    req.ownership_verified = true;
    req.aspect_ratio = AspectRatio::Landscape16x9;
    req.resolution = ResolutionTier::High;

    let artifact = adapter
        .invoke(&req, &CancellationToken::new())
        .await
        .unwrap();

    mock.assert_async().await;
    assert_stored_png(&media, &artifact).await;
}

#[tokio::test]
async fn test_composite_requires_ownership() {
    let adapter = CompositeAdapter {
        client: Arc::new(GeminiClient::new(
            reqwest::Client::new(),
            "test-key",
            "http://127.0.0.1:9",
        )),
        media: Arc::new(MediaStore::new()),
        model: "image-model".to_string(),
    };
    let mut req = request(Mode::Composite);
    req.primary = Some(photo());
    req.reference = Some(photo());

    let err = adapter
        .invoke(&req, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, StudioError::InvalidState(_)));
}

#[tokio::test]
#[serial]
async fn test_edit_sends_image_then_instruction() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/models/edit-model:generateContent")
        .match_query(Matcher::Any)
        .match_body(Matcher::PartialJson(json!({
            "contents": [{"parts": [
                {"inlineData": {"mimeType": "image/jpeg", "data": BASE64_STANDARD.encode([1u8, 2, 3, 4])}},
                {"text": "make it snow"}
            ]}],
            "generationConfig": {"responseModalities": ["IMAGE"]}
        })))
        .with_status(200)
        .with_body(image_response())
        .create_async()
        .await;

    let media = Arc::new(MediaStore::new());
    let adapter = EditAdapter {
        client: client(&server),
        media: media.clone(),
        model: "edit-model".to_string(),
    };
    let mut req = request(Mode::Edit);
    req.primary = Some(photo());
    req.directive = "make it snow".to_string();

    let artifact = adapter
        .invoke(&req, &CancellationToken::new())
        .await
        .unwrap();

    mock.assert_async().await;
    assert_stored_png(&media, &artifact).await;
}

#[tokio::test]
#[serial]
async fn test_image_mode_without_inline_data_is_provider_error() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/models/image-model:generateContent")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(text_response("I can't draw that"))
        .create_async()
        .await;

    let adapter = GenerateAdapter {
        client: client(&server),
        media: Arc::new(MediaStore::new()),
        model: "image-model".to_string(),
    };
    let mut req = request(Mode::Generate);
    req.directive = "anything".to_string();

    let err = adapter
        .invoke(&req, &CancellationToken::new())
        .await
        .unwrap_err();

    mock.assert_async().await;
    assert_eq!(err, StudioError::provider("No image was returned"));
}

fn animate_adapter(server: &ServerGuard, media: Arc<MediaStore>) -> AnimateAdapter {
    AnimateAdapter {
        client: client(server),
        media,
        model: "veo".to_string(),
        poller: JobPoller::new(Duration::from_millis(10), None),
    }
}

async fn run_animate(aspect_ratio: AspectRatio, expected_ratio: &str) {
    let mut server = Server::new_async().await;
    let video_uri = format!("{}/files/clip.mp4:download?alt=media", server.url());

    let submit = server
        .mock("POST", "/models/veo:predictLongRunning")
        .match_header(API_KEY_HEADER, "test-key")
        .match_body(Matcher::PartialJson(json!({
            "instances": [{
                "prompt": "the waves roll in",
                "image": {"bytesBase64Encoded": BASE64_STANDARD.encode([1u8, 2, 3, 4]), "mimeType": "image/jpeg"}
            }],
            "parameters": {"aspectRatio": expected_ratio, "sampleCount": 1}
        })))
        .with_status(200)
        .with_body(r#"{"name": "models/veo/operations/op1", "done": false}"#)
        .create_async()
        .await;
    let poll = server
        .mock("GET", "/models/veo/operations/op1")
        .match_header(API_KEY_HEADER, "test-key")
        .with_status(200)
        .with_body(
            json!({
                "name": "models/veo/operations/op1",
                "done": true,
                "response": {"generateVideoResponse": {"generatedSamples": [{"video": {"uri": video_uri}}]}}
            })
            .to_string(),
        )
        .create_async()
        .await;
    let download = server
        .mock("GET", "/files/clip.mp4:download")
        .match_query(Matcher::UrlEncoded("alt".into(), "media".into()))
        .match_header(API_KEY_HEADER, "test-key")
        .with_status(200)
        .with_body(vec![0u8, 0, 0, 24])
        .create_async()
        .await;

    let media = Arc::new(MediaStore::new());
    let adapter = animate_adapter(&server, media.clone());
    let mut req = request(Mode::Animate);
    req.primary = Some(photo());
    req.directive = "the waves roll in".to_string();
    req.aspect_ratio = aspect_ratio;

    let artifact = adapter
        .invoke(&req, &CancellationToken::new())
        .await
        .unwrap();

    submit.assert_async().await;
    poll.assert_async().await;
    download.assert_async().await;

    match artifact {
        ResultArtifact::Video { locator, mime_type } => {
            assert_eq!(mime_type, "video/mp4");
            assert_eq!(media.resolve(&locator).await.unwrap().data, vec![0, 0, 0, 24]);
        }
        other => panic!("expected video artifact, got {:?}", other),
    }
}

#[tokio::test]
#[serial]
async fn test_animate_collapses_unsupported_ratio_to_landscape() {
    run_animate(AspectRatio::Portrait3x4, "16:9").await;
}

#[tokio::test]
#[serial]
async fn test_animate_keeps_portrait_ratio() {
    run_animate(AspectRatio::Portrait9x16, "9:16").await;
}

#[tokio::test]
#[serial]
async fn test_animate_failed_operation_is_provider_error() {
    let mut server = Server::new_async().await;
    let _submit = server
        .mock("POST", "/models/veo:predictLongRunning")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"name": "models/veo/operations/bad", "done": false}"#)
        .create_async()
        .await;
    let _poll = server
        .mock("GET", "/models/veo/operations/bad")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(
            r#"{"name": "models/veo/operations/bad", "done": true, "error": {"code": 3, "message": "unsafe content"}}"#,
        )
        .create_async()
        .await;

    let adapter = animate_adapter(&server, Arc::new(MediaStore::new()));
    let mut req = request(Mode::Animate);
    req.primary = Some(photo());

    let err = adapter
        .invoke(&req, &CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(err, StudioError::provider("unsafe content"));
}

#[tokio::test]
#[serial]
async fn test_analyze_uses_default_prompt() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/models/text-model:generateContent")
        .match_query(Matcher::Any)
        .match_body(Matcher::PartialJson(json!({
            "contents": [{"parts": [
                {"inlineData": {"mimeType": "image/jpeg"}},
                {"text": "Describe this image in detail."}
            ]}]
        })))
        .with_status(200)
        .with_body(text_response("A red barn in a field."))
        .create_async()
        .await;

    let adapter = AnalyzeAdapter {
        client: client(&server),
        model: "text-model".to_string(),
    };
    let mut req = request(Mode::Analyze);
    req.primary = Some(photo());

    let artifact = adapter
        .invoke(&req, &CancellationToken::new())
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(
        artifact,
        ResultArtifact::Text {
            content: "A red barn in a field.".to_string()
        }
    );
}

#[tokio::test]
#[serial]
async fn test_culinary_returns_text() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/models/text-model:generateContent")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(text_response("## Margherita pizza"))
        .create_async()
        .await;

    let adapter = CulinaryAdapter {
        client: client(&server),
        model: "text-model".to_string(),
    };
    let mut req = request(Mode::Culinary);
    req.primary = Some(photo());
    req.directive = "vegan please".to_string();

    let artifact = adapter
        .invoke(&req, &CancellationToken::new())
        .await
        .unwrap();

    mock.assert_async().await;
    assert!(matches!(artifact, ResultArtifact::Text { content } if content.starts_with("## Margherita")));
}

#[tokio::test]
#[serial]
async fn test_reason_enables_search_and_appends_sources() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/models/reasoning-model:generateContent")
        .match_query(Matcher::Any)
        .match_body(Matcher::PartialJson(json!({
            "contents": [{"parts": [{"text": "why is the sky blue"}]}],
            "tools": [{"googleSearch": {}}]
        })))
        .with_status(200)
        .with_body(
            json!({
                "candidates": [{
                    "content": {"parts": [{"text": "Rayleigh scattering."}]},
                    "groundingMetadata": {"groundingChunks": [
                        {"web": {"uri": "https://a.example", "title": "Optics"}},
                        {"web": {"uri": "https://a.example", "title": "Optics again"}},
                        {"web": {"uri": "https://b.example"}}
                    ]}
                }]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let adapter = ReasonAdapter {
        client: client(&server),
        model: "reasoning-model".to_string(),
    };
    let mut req = request(Mode::Reason);
    req.directive = "why is the sky blue".to_string();

    let artifact = adapter
        .invoke(&req, &CancellationToken::new())
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(
        artifact,
        ResultArtifact::Text {
            content: "Rayleigh scattering.\n\n---\n**Sources:**\n1. [Optics](https://a.example)\n2. [https://b.example](https://b.example)".to_string()
        }
    );
}
