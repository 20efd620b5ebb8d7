//! Provider adapters
//!
//! One adapter per generation mode. Each shapes a [`RequestDescriptor`] into
//! exactly one Gemini call contract and turns the reply into a
//! [`ResultArtifact`]. Missing payloads are reported, never papered over.

use crate::provider::api_client::GeminiClient;
use crate::provider::gemini_types::{
    GenerateContentRequest, GenerateContentResponse, GenerationConfig, GoogleSearch,
    ImageConfig, Operation, Part, PredictLongRunningRequest, Tool, VideoImage, VideoInstance,
    VideoParameters, WebSource,
};
use crate::studio::constants::{
    COMPOSITE_INSTRUCTION, CULINARY_BASE_INSTRUCTION, DEFAULT_ANALYZE_DIRECTIVE,
    DEFAULT_ANIMATE_DIRECTIVE, DEFAULT_IMAGE_MIME, DEFAULT_VIDEO_MIME,
};
use crate::studio::{
    AspectRatio, InputAsset, JobHandle, JobOutcome, JobPoller, MediaStore, Mode,
    RequestDescriptor, ResolutionTier, ResultArtifact, StudioConfig, StudioError,
};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Composite ignores the user's settings and always renders square at the mid tier
pub const COMPOSITE_ASPECT_RATIO: AspectRatio = AspectRatio::Square;

/// See [`COMPOSITE_ASPECT_RATIO`]
pub const COMPOSITE_RESOLUTION: ResolutionTier = ResolutionTier::Mid;

/// Interface to one generation capability
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Run the request to completion
    ///
    /// Long-running adapters watch `cancel` while waiting.
    async fn invoke(
        &self,
        request: &RequestDescriptor,
        cancel: &CancellationToken,
    ) -> Result<ResultArtifact, StudioError>;

    /// Whether `invoke` honours its cancellation token
    fn cancellable(&self) -> bool {
        false
    }
}

/// Adapter registry keyed by mode
#[derive(Clone, Default)]
pub struct AdapterSet {
    adapters: HashMap<Mode, Arc<dyn ProviderAdapter>>,
}

impl AdapterSet {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `adapter` for `mode`, replacing any previous one
    pub fn with(mut self, mode: Mode, adapter: Arc<dyn ProviderAdapter>) -> Self {
        self.adapters.insert(mode, adapter);
        self
    }

    /// Adapter for `mode`
    pub fn get(&self, mode: Mode) -> Result<Arc<dyn ProviderAdapter>, StudioError> {
        self.adapters
            .get(&mode)
            .cloned()
            .ok_or_else(|| StudioError::Provider(format!("No adapter registered for {}", mode)))
    }

    /// Gemini-backed adapters for every mode
    pub fn gemini(client: Arc<GeminiClient>, media: Arc<MediaStore>, config: &StudioConfig) -> Self {
        let poller = JobPoller::new(config.poll_interval(), config.poll_timeout());

        Self::new()
            .with(
                Mode::Composite,
                Arc::new(CompositeAdapter {
                    client: client.clone(),
                    media: media.clone(),
                    model: config.image_model.clone(),
                }),
            )
            .with(
                Mode::Generate,
                Arc::new(GenerateAdapter {
                    client: client.clone(),
                    media: media.clone(),
                    model: config.image_model.clone(),
                }),
            )
            .with(
                Mode::Edit,
                Arc::new(EditAdapter {
                    client: client.clone(),
                    media: media.clone(),
                    model: config.edit_model.clone(),
                }),
            )
            .with(
                Mode::Animate,
                Arc::new(AnimateAdapter {
                    client: client.clone(),
                    media,
                    model: config.video_model.clone(),
                    poller,
                }),
            )
            .with(
                Mode::Analyze,
                Arc::new(AnalyzeAdapter {
                    client: client.clone(),
                    model: config.text_model.clone(),
                }),
            )
            .with(
                Mode::Culinary,
                Arc::new(CulinaryAdapter {
                    client: client.clone(),
                    model: config.text_model.clone(),
                }),
            )
            .with(
                Mode::Reason,
                Arc::new(ReasonAdapter {
                    client,
                    model: config.reasoning_model.clone(),
                }),
            )
    }
}

/// Scene (`primary`) + subject (`reference`) composition
pub struct CompositeAdapter {
    /// Gemini client
    pub client: Arc<GeminiClient>,
    /// Where generated images are stored
    pub media: Arc<MediaStore>,
    /// Image model
    pub model: String,
}

#[async_trait]
impl ProviderAdapter for CompositeAdapter {
    async fn invoke(
        &self,
        request: &RequestDescriptor,
        _cancel: &CancellationToken,
    ) -> Result<ResultArtifact, StudioError> {
        if !request.ownership_verified {
            return Err(StudioError::InvalidState(
                "Composite requires ownership confirmation".to_string(),
            ));
        }
        let scene = request.require_primary()?;
        let subject = request.require_reference()?;

        let mut instruction = COMPOSITE_INSTRUCTION.to_string();
        if !request.directive.trim().is_empty() {
            instruction.push_str("\n\n");
            instruction.push_str(request.directive.trim());
        }

        let mut body = GenerateContentRequest::user(vec![
            inline_part(scene),
            inline_part(subject),
            Part::text(instruction),
        ]);
        body.generation_config = Some(image_generation_config(Some((
            COMPOSITE_ASPECT_RATIO,
            COMPOSITE_RESOLUTION,
        ))));

        let response = self.client.generate_content(&self.model, &body).await?;
        store_image(&self.media, &response).await
    }
}

/// Text-to-image
pub struct GenerateAdapter {
    /// Gemini client
    pub client: Arc<GeminiClient>,
    /// Where generated images are stored
    pub media: Arc<MediaStore>,
    /// Image model
    pub model: String,
}

#[async_trait]
impl ProviderAdapter for GenerateAdapter {
    async fn invoke(
        &self,
        request: &RequestDescriptor,
        _cancel: &CancellationToken,
    ) -> Result<ResultArtifact, StudioError> {
        let mut body = GenerateContentRequest::user(vec![Part::text(request.directive.clone())]);
        body.generation_config = Some(image_generation_config(Some((
            request.aspect_ratio,
            request.resolution,
        ))));

        let response = self.client.generate_content(&self.model, &body).await?;
        store_image(&self.media, &response).await
    }
}

/// Image + instruction editing
pub struct EditAdapter {
    /// Gemini client
    pub client: Arc<GeminiClient>,
    /// Where generated images are stored
    pub media: Arc<MediaStore>,
    /// Edit model
    pub model: String,
}

#[async_trait]
impl ProviderAdapter for EditAdapter {
    async fn invoke(
        &self,
        request: &RequestDescriptor,
        _cancel: &CancellationToken,
    ) -> Result<ResultArtifact, StudioError> {
        let source = request.require_primary()?;

        let mut body = GenerateContentRequest::user(vec![
            inline_part(source),
            Part::text(request.directive.clone()),
        ]);
        body.generation_config = Some(image_generation_config(None));

        let response = self.client.generate_content(&self.model, &body).await?;
        store_image(&self.media, &response).await
    }
}

/// Image-to-video through a long-running operation
pub struct AnimateAdapter {
    /// Gemini client
    pub client: Arc<GeminiClient>,
    /// Where downloaded videos are stored
    pub media: Arc<MediaStore>,
    /// Video model
    pub model: String,
    /// Drives the operation to completion
    pub poller: JobPoller,
}

#[async_trait]
impl ProviderAdapter for AnimateAdapter {
    async fn invoke(
        &self,
        request: &RequestDescriptor,
        cancel: &CancellationToken,
    ) -> Result<ResultArtifact, StudioError> {
        let source = request.require_primary()?;

        let prompt = if request.directive.trim().is_empty() {
            DEFAULT_ANIMATE_DIRECTIVE.to_string()
        } else {
            request.directive.clone()
        };

        let body = PredictLongRunningRequest {
            instances: vec![VideoInstance {
                prompt,
                image: Some(VideoImage {
                    bytes_base64_encoded: BASE64_STANDARD.encode(&source.data),
                    mime_type: source.mime_type.clone(),
                }),
            }],
            parameters: VideoParameters {
                aspect_ratio: request.aspect_ratio.for_video().as_str().to_string(),
                sample_count: 1,
            },
        };

        let operation = self.client.submit_video(&self.model, &body).await?;
        info!(
            operation = %operation.name,
            interval_ms = self.poller.interval().as_millis() as u64,
            "Video job submitted"
        );

        let client = self.client.clone();
        let uri = self
            .poller
            .wait(
                job_handle(operation),
                move |handle: JobHandle| {
                    let client = client.clone();
                    async move { client.get_operation(&handle.name).await.map(job_handle) }
                },
                cancel,
            )
            .await?;

        let bytes = self.client.download(&uri).await?;
        let locator = self.media.put(bytes, DEFAULT_VIDEO_MIME).await;

        Ok(ResultArtifact::Video {
            locator,
            mime_type: DEFAULT_VIDEO_MIME.to_string(),
        })
    }

    fn cancellable(&self) -> bool {
        true
    }
}

/// Image description
pub struct AnalyzeAdapter {
    /// Gemini client
    pub client: Arc<GeminiClient>,
    /// Text model
    pub model: String,
}

#[async_trait]
impl ProviderAdapter for AnalyzeAdapter {
    async fn invoke(
        &self,
        request: &RequestDescriptor,
        _cancel: &CancellationToken,
    ) -> Result<ResultArtifact, StudioError> {
        let source = request.require_primary()?;

        let prompt = if request.directive.trim().is_empty() {
            DEFAULT_ANALYZE_DIRECTIVE.to_string()
        } else {
            request.directive.clone()
        };

        let body = GenerateContentRequest::user(vec![inline_part(source), Part::text(prompt)]);
        let response = self.client.generate_content(&self.model, &body).await?;
        text_artifact(response.text(), None)
    }
}

/// Dish recognition, nutrition and recipe
pub struct CulinaryAdapter {
    /// Gemini client
    pub client: Arc<GeminiClient>,
    /// Text model
    pub model: String,
}

#[async_trait]
impl ProviderAdapter for CulinaryAdapter {
    async fn invoke(
        &self,
        request: &RequestDescriptor,
        _cancel: &CancellationToken,
    ) -> Result<ResultArtifact, StudioError> {
        let source = request.require_primary()?;

        let body = GenerateContentRequest::user(vec![
            inline_part(source),
            Part::text(culinary_prompt(&request.directive)),
        ]);
        let response = self.client.generate_content(&self.model, &body).await?;
        text_artifact(response.text(), None)
    }
}

/// Search-grounded deep reasoning
pub struct ReasonAdapter {
    /// Gemini client
    pub client: Arc<GeminiClient>,
    /// Reasoning model
    pub model: String,
}

#[async_trait]
impl ProviderAdapter for ReasonAdapter {
    async fn invoke(
        &self,
        request: &RequestDescriptor,
        _cancel: &CancellationToken,
    ) -> Result<ResultArtifact, StudioError> {
        let mut body = GenerateContentRequest::user(vec![Part::text(request.directive.clone())]);
        body.tools = Some(vec![Tool {
            google_search: Some(GoogleSearch {}),
        }]);

        let response = self.client.generate_content(&self.model, &body).await?;
        let sources: Vec<WebSource> = response
            .candidates
            .first()
            .and_then(|c| c.grounding_metadata.as_ref())
            .map(|g| g.grounding_chunks.iter().filter_map(|c| c.web.clone()).collect())
            .unwrap_or_default();

        text_artifact(response.text(), Some(sources.as_slice()))
    }
}

/// Culinary prompt: the fixed instruction, then the user's directive if any
pub fn culinary_prompt(directive: &str) -> String {
    let directive = directive.trim();
    if directive.is_empty() {
        CULINARY_BASE_INSTRUCTION.to_string()
    } else {
        format!("{}\n\n{}", CULINARY_BASE_INSTRUCTION, directive)
    }
}

/// Render grounding sources as a markdown trailer (empty when there are none)
pub fn format_citations(sources: &[WebSource]) -> String {
    let mut seen = Vec::new();
    let mut lines = Vec::new();

    for source in sources {
        if source.uri.is_empty() || seen.contains(&source.uri.as_str()) {
            continue;
        }
        seen.push(source.uri.as_str());
        let title = source
            .title
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or(source.uri.as_str());
        lines.push(format!("{}. [{}]({})", lines.len() + 1, title, source.uri));
    }

    if lines.is_empty() {
        return String::new();
    }
    format!("\n\n---\n**Sources:**\n{}", lines.join("\n"))
}

fn job_handle(operation: Operation) -> JobHandle {
    let outcome = if !operation.done {
        None
    } else if let Some(error) = &operation.error {
        Some(JobOutcome::Failed(
            error
                .message
                .clone()
                .unwrap_or_else(|| format!("Video job failed (code {:?})", error.code)),
        ))
    } else {
        operation
            .video_uri()
            .map(|uri| JobOutcome::Artifact(uri.to_string()))
    };

    JobHandle {
        name: operation.name,
        done: operation.done,
        outcome,
    }
}

fn inline_part(asset: &InputAsset) -> Part {
    Part::inline(asset.mime_type.clone(), BASE64_STANDARD.encode(&asset.data))
}

fn image_generation_config(overrides: Option<(AspectRatio, ResolutionTier)>) -> GenerationConfig {
    GenerationConfig {
        response_modalities: Some(vec!["IMAGE".to_string()]),
        image_config: overrides.map(|(aspect_ratio, resolution)| ImageConfig {
            aspect_ratio: Some(aspect_ratio.as_str().to_string()),
            image_size: Some(resolution.as_str().to_string()),
        }),
        speech_config: None,
    }
}

async fn store_image(
    media: &MediaStore,
    response: &GenerateContentResponse,
) -> Result<ResultArtifact, StudioError> {
    let inline = response
        .first_inline_data()
        .ok_or_else(|| StudioError::provider("No image was returned"))?;

    let bytes = BASE64_STANDARD
        .decode(&inline.data)
        .map_err(|e| StudioError::Provider(format!("Failed to decode image data: {}", e)))?;
    if bytes.is_empty() {
        return Err(StudioError::provider("No image was returned"));
    }

    let mime_type = if inline.mime_type.is_empty() {
        DEFAULT_IMAGE_MIME.to_string()
    } else {
        inline.mime_type.clone()
    };
    let locator = media.put(bytes, mime_type.clone()).await;

    Ok(ResultArtifact::Image { locator, mime_type })
}

fn text_artifact(
    text: String,
    sources: Option<&[WebSource]>,
) -> Result<ResultArtifact, StudioError> {
    if text.trim().is_empty() {
        return Err(StudioError::provider("No text was returned"));
    }
    let trailer = sources.map(format_citations).unwrap_or_default();
    Ok(ResultArtifact::Text {
        content: format!("{}{}", text, trailer),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::gemini_types::OperationError;

    fn source(uri: &str, title: Option<&str>) -> WebSource {
        WebSource {
            uri: uri.to_string(),
            title: title.map(str::to_string),
        }
    }

    #[test]
    fn test_format_citations() {
        let trailer = format_citations(&[
            source("https://a.example", Some("Alpha")),
            source("https://b.example", None),
            source("https://a.example", Some("Alpha again")),
            source("", Some("empty")),
        ]);
        assert_eq!(
            trailer,
            "\n\n---\n**Sources:**\n1. [Alpha](https://a.example)\n2. [https://b.example](https://b.example)"
        );
        assert_eq!(format_citations(&[]), "");
    }

    #[test]
    fn test_culinary_prompt_appends_directive() {
        assert_eq!(culinary_prompt("  "), CULINARY_BASE_INSTRUCTION);
        let prompt = culinary_prompt("make it vegan");
        assert!(prompt.starts_with(CULINARY_BASE_INSTRUCTION));
        assert!(prompt.ends_with("\n\nmake it vegan"));
    }

    #[test]
    fn test_job_handle_from_operation() {
        let pending = job_handle(Operation {
            name: "op".to_string(),
            ..Default::default()
        });
        assert!(!pending.done);
        assert!(pending.outcome.is_none());

        let failed = job_handle(Operation {
            name: "op".to_string(),
            done: true,
            error: Some(OperationError {
                code: Some(8),
                message: Some("quota".to_string()),
            }),
            ..Default::default()
        });
        assert_eq!(failed.outcome, Some(JobOutcome::Failed("quota".to_string())));

        let empty = job_handle(Operation {
            name: "op".to_string(),
            done: true,
            ..Default::default()
        });
        assert!(empty.done);
        assert!(empty.outcome.is_none());
    }

    #[test]
    fn test_text_artifact_rejects_empty() {
        assert_eq!(
            text_artifact("   ".to_string(), None).unwrap_err(),
            StudioError::provider("No text was returned")
        );
        assert_eq!(
            text_artifact("answer".to_string(), Some(&[][..])).unwrap(),
            ResultArtifact::Text {
                content: "answer".to_string()
            }
        );
    }

    #[test]
    fn test_adapter_set_lookup() {
        let set = AdapterSet::new();
        assert!(set.get(Mode::Edit).is_err());
    }
}
