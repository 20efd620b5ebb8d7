//! Studio constants
//!
//! Fixed prompts and request parameters used by the generation workflows.

/// Directive used for Animate when the user leaves the prompt empty
pub const DEFAULT_ANIMATE_DIRECTIVE: &str =
    "Bring this image to life with subtle, natural cinematic motion.";

/// Directive used for Analyze when the user leaves the prompt empty
pub const DEFAULT_ANALYZE_DIRECTIVE: &str = "Describe this image in detail.";

/// Base instruction that Culinary appends the user's directive to
pub const CULINARY_BASE_INSTRUCTION: &str = "You are an expert chef and nutritionist. \
Identify the dish in this image, list its likely ingredients, estimate its nutritional \
content per serving, and give a step-by-step recipe to recreate it.";

/// Instruction sent with Composite so the subject is placed into the scene
pub const COMPOSITE_INSTRUCTION: &str = "Compose the subject from the second image into \
the scene from the first image, matching lighting, perspective and scale.";

/// MIME type assumed for generated images when the provider omits one
pub const DEFAULT_IMAGE_MIME: &str = "image/png";

/// MIME type assumed for downloaded videos
pub const DEFAULT_VIDEO_MIME: &str = "video/mp4";

/// Sample rate of synthesized speech (Hz)
pub const SPEECH_SAMPLE_RATE: u32 = 24_000;

/// Channel count of synthesized speech
pub const SPEECH_CHANNELS: u16 = 1;

/// Route prefix under which stored media is served
pub const MEDIA_ROUTE_PREFIX: &str = "/api/media/";

/// Status phrase shown while no job has run yet
pub const STATUS_READY: &str = "Ready";

/// Status phrase shown after a successful job
pub const STATUS_DONE: &str = "Done";

/// Status phrase shown after a failed job
pub const STATUS_FAILED: &str = "Something went wrong";
