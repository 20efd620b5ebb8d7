//! Result chaining
//!
//! Turns a completed result into the seed inputs of another mode.

use crate::studio::codec::reingest_image;
use crate::studio::constants::DEFAULT_IMAGE_MIME;
use crate::studio::error::StudioError;
use crate::studio::media::MediaStore;
use crate::studio::types::{InputAsset, ResultArtifact};

/// Inputs derived from a previous result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainSeed {
    /// Becomes the new `primary` asset; `reference` and directive are cleared
    Image(InputAsset),
    /// Becomes the new directive; assets are left alone
    Text(String),
}

/// Derive the seed for the next mode from `artifact`
///
/// Images are re-fetched from the media store so the new input owns its bytes.
/// Video results have no defined chaining and are rejected.
pub async fn derive_seed(
    artifact: &ResultArtifact,
    media: &MediaStore,
) -> Result<ChainSeed, StudioError> {
    match artifact {
        ResultArtifact::Image { locator, .. } => {
            let asset = reingest_image(media, locator, DEFAULT_IMAGE_MIME).await?;
            Ok(ChainSeed::Image(asset))
        }
        ResultArtifact::Text { content } => Ok(ChainSeed::Text(content.clone())),
        ResultArtifact::Video { .. } => Err(StudioError::Chain(
            "Video results cannot be used as input".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::studio::types::MediaLocator;

    #[tokio::test]
    async fn test_image_seed_refetches_bytes() {
        let media = MediaStore::new();
        let locator = media.put(vec![1, 2], "image/png").await;
        let artifact = ResultArtifact::Image {
            locator: locator.clone(),
            mime_type: "image/png".to_string(),
        };

        match derive_seed(&artifact, &media).await.unwrap() {
            ChainSeed::Image(asset) => {
                assert_eq!(asset.data, vec![1, 2]);
                assert_eq!(asset.display_ref, locator.as_str());
            }
            other => panic!("expected image seed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_text_seed_is_verbatim() {
        let media = MediaStore::new();
        let content = "  **Bold** answer\nwith lines  ".to_string();
        let artifact = ResultArtifact::Text {
            content: content.clone(),
        };

        assert_eq!(
            derive_seed(&artifact, &media).await.unwrap(),
            ChainSeed::Text(content)
        );
    }

    #[tokio::test]
    async fn test_video_is_not_chainable() {
        let media = MediaStore::new();
        let artifact = ResultArtifact::Video {
            locator: MediaLocator("/api/media/v".to_string()),
            mime_type: "video/mp4".to_string(),
        };
        assert!(matches!(
            derive_seed(&artifact, &media).await,
            Err(StudioError::Chain(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_image_is_chain_error() {
        let media = MediaStore::new();
        let artifact = ResultArtifact::Image {
            locator: MediaLocator("/api/media/evicted".to_string()),
            mime_type: "image/png".to_string(),
        };
        assert!(matches!(
            derive_seed(&artifact, &media).await,
            Err(StudioError::Chain(_))
        ));
    }
}
