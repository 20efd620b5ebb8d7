//! Studio data model
//!
//! Modes, input assets, request descriptors, results and session snapshots.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Generation workflow selected by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Place a subject image into a scene image
    Composite,
    /// Text-to-image
    Generate,
    /// Image + instruction to image
    Edit,
    /// Image to video
    Animate,
    /// Image to description
    Analyze,
    /// Food image to recipe and nutrition
    Culinary,
    /// Text-only deep reasoning with search grounding
    Reason,
}

impl Mode {
    /// All modes, in display order
    pub const ALL: [Mode; 7] = [
        Mode::Composite,
        Mode::Generate,
        Mode::Edit,
        Mode::Animate,
        Mode::Analyze,
        Mode::Culinary,
        Mode::Reason,
    ];

    /// Lowercase identifier used on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Composite => "composite",
            Mode::Generate => "generate",
            Mode::Edit => "edit",
            Mode::Animate => "animate",
            Mode::Analyze => "analyze",
            Mode::Culinary => "culinary",
            Mode::Reason => "reason",
        }
    }

    /// Whether a submit in this mode needs non-empty directive text
    pub fn requires_directive(&self) -> bool {
        matches!(self, Mode::Generate | Mode::Reason)
    }

    /// Whether a submit in this mode needs the `primary` asset
    pub fn requires_primary(&self) -> bool {
        matches!(
            self,
            Mode::Composite | Mode::Edit | Mode::Animate | Mode::Analyze | Mode::Culinary
        )
    }

    /// Whether a submit in this mode needs the `reference` asset and ownership confirmation
    pub fn requires_reference(&self) -> bool {
        matches!(self, Mode::Composite)
    }

    /// Status phrase shown while a job in this mode is running
    pub fn progress_phrase(&self) -> &'static str {
        match self {
            Mode::Composite => "Compositing images...",
            Mode::Generate => "Generating image...",
            Mode::Edit => "Editing image...",
            Mode::Animate => "Rendering video... this can take a few minutes",
            Mode::Analyze => "Analyzing image...",
            Mode::Culinary => "Analyzing dish...",
            Mode::Reason => "Thinking deeply...",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mode::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| format!("Unknown mode: {}", s))
    }
}

/// Named input slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetSlot {
    /// Main image (scene for Composite)
    Primary,
    /// Secondary image (subject for Composite)
    Reference,
}

impl FromStr for AssetSlot {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "primary" => Ok(AssetSlot::Primary),
            "reference" => Ok(AssetSlot::Reference),
            other => Err(format!("Unknown asset slot: {}", other)),
        }
    }
}

/// One user-supplied image
#[derive(Clone, PartialEq, Eq)]
pub struct InputAsset {
    /// Raw image bytes
    pub data: Vec<u8>,
    /// MIME type, e.g. `image/png`
    pub mime_type: String,
    /// Locator the rendering side can use to preview the asset
    pub display_ref: String,
}

impl InputAsset {
    /// Create an asset from its parts
    pub fn new(data: Vec<u8>, mime_type: impl Into<String>, display_ref: impl Into<String>) -> Self {
        Self {
            data,
            mime_type: mime_type.into(),
            display_ref: display_ref.into(),
        }
    }

    /// Metadata view without the payload
    pub fn summary(&self) -> AssetSummary {
        AssetSummary {
            mime_type: self.mime_type.clone(),
            display_ref: self.display_ref.clone(),
            size_bytes: self.data.len(),
        }
    }
}

impl fmt::Debug for InputAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputAsset")
            .field("mime_type", &self.mime_type)
            .field("display_ref", &self.display_ref)
            .field("size_bytes", &self.data.len())
            .finish()
    }
}

/// Serializable description of an input asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetSummary {
    /// MIME type
    pub mime_type: String,
    /// Preview locator
    pub display_ref: String,
    /// Payload size
    pub size_bytes: usize,
}

/// Output aspect ratio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AspectRatio {
    /// 1:1
    #[default]
    #[serde(rename = "1:1")]
    Square,
    /// 3:4
    #[serde(rename = "3:4")]
    Portrait3x4,
    /// 4:3
    #[serde(rename = "4:3")]
    Landscape4x3,
    /// 9:16
    #[serde(rename = "9:16")]
    Portrait9x16,
    /// 16:9
    #[serde(rename = "16:9")]
    Landscape16x9,
}

impl AspectRatio {
    /// Ratio string as the provider expects it
    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Square => "1:1",
            AspectRatio::Portrait3x4 => "3:4",
            AspectRatio::Landscape4x3 => "4:3",
            AspectRatio::Portrait9x16 => "9:16",
            AspectRatio::Landscape16x9 => "16:9",
        }
    }

    /// Video generation only supports 9:16 and 16:9; everything else collapses to 16:9
    pub fn for_video(self) -> AspectRatio {
        match self {
            AspectRatio::Portrait9x16 => AspectRatio::Portrait9x16,
            _ => AspectRatio::Landscape16x9,
        }
    }
}

/// Output resolution tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ResolutionTier {
    /// ~1024px
    #[default]
    #[serde(rename = "1K")]
    Low,
    /// ~2048px
    #[serde(rename = "2K")]
    Mid,
    /// ~4096px
    #[serde(rename = "4K")]
    High,
}

impl ResolutionTier {
    /// Size string as the provider expects it
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionTier::Low => "1K",
            ResolutionTier::Mid => "2K",
            ResolutionTier::High => "4K",
        }
    }
}

/// Validated, mode-specific inputs for one submit
///
/// Built by [`ModeController::begin_submit`](crate::studio::ModeController::begin_submit)
/// and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    /// Mode the request was built for
    pub mode: Mode,
    /// `primary` asset, when present
    pub primary: Option<InputAsset>,
    /// `reference` asset, when present
    pub reference: Option<InputAsset>,
    /// Free-text directive (may be empty)
    pub directive: String,
    /// User-selected aspect ratio
    pub aspect_ratio: AspectRatio,
    /// User-selected resolution tier
    pub resolution: ResolutionTier,
    /// Composite ownership confirmation
    pub ownership_verified: bool,
}

impl RequestDescriptor {
    /// The `primary` asset, or an invalid-state error naming the mode
    pub fn require_primary(&self) -> Result<&InputAsset, crate::studio::StudioError> {
        self.primary.as_ref().ok_or_else(|| {
            crate::studio::StudioError::InvalidState(format!(
                "{} requires a primary image",
                self.mode
            ))
        })
    }

    /// The `reference` asset, or an invalid-state error naming the mode
    pub fn require_reference(&self) -> Result<&InputAsset, crate::studio::StudioError> {
        self.reference.as_ref().ok_or_else(|| {
            crate::studio::StudioError::InvalidState(format!(
                "{} requires a reference image",
                self.mode
            ))
        })
    }
}

/// Locator for a stored media blob
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaLocator(pub String);

impl MediaLocator {
    /// The locator string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MediaLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of a successful generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ResultArtifact {
    /// Generated image
    Image {
        /// Where the image can be fetched
        locator: MediaLocator,
        /// Image MIME type
        mime_type: String,
    },
    /// Generated video
    Video {
        /// Where the video can be fetched
        locator: MediaLocator,
        /// Video MIME type
        mime_type: String,
    },
    /// Generated text (markdown)
    Text {
        /// Text body
        content: String,
    },
}

impl ResultArtifact {
    /// Kind of the artifact
    pub fn kind(&self) -> ArtifactKind {
        match self {
            ResultArtifact::Image { .. } => ArtifactKind::Image,
            ResultArtifact::Video { .. } => ArtifactKind::Video,
            ResultArtifact::Text { .. } => ArtifactKind::Text,
        }
    }
}

/// Tag of a [`ResultArtifact`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    /// Image
    Image,
    /// Video
    Video,
    /// Text
    Text,
}

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Nothing running, no outcome shown
    Idle,
    /// A job is in flight
    Generating,
    /// The last job produced a result
    Success,
    /// The last job failed
    Error,
}

/// Read-only view of the session handed to the rendering side
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    /// Current mode
    pub mode: Mode,
    /// Lifecycle state
    pub status: SessionStatus,
    /// Human-readable status phrase
    pub status_message: String,
    /// Current result, if any
    pub result: Option<ResultArtifact>,
    /// Current error text, if any
    pub error: Option<String>,
    /// Directive text
    pub directive: String,
    /// `primary` asset metadata
    pub primary: Option<AssetSummary>,
    /// `reference` asset metadata
    pub reference: Option<AssetSummary>,
    /// Selected aspect ratio
    pub aspect_ratio: AspectRatio,
    /// Selected resolution tier
    pub resolution: ResolutionTier,
    /// Composite ownership confirmation
    pub ownership_verified: bool,
    /// Whether a submit would currently be accepted
    pub can_submit: bool,
}

/// In-flight long-running job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle {
    /// Provider-side job name
    pub name: String,
    /// Whether the job has finished
    pub done: bool,
    /// Outcome once finished
    pub outcome: Option<JobOutcome>,
}

impl JobHandle {
    /// A handle for a job that has not finished yet
    pub fn pending(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            done: false,
            outcome: None,
        }
    }
}

/// Result of a finished job
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// Locator of the produced artifact
    Artifact(String),
    /// Provider-reported failure
    Failed(String),
}
