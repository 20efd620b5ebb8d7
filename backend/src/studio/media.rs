//! In-memory media store
//!
//! Holds generated and uploaded blobs and hands out `/api/media/{id}` locators
//! that the rendering side can fetch.

use crate::studio::constants::MEDIA_ROUTE_PREFIX;
use crate::studio::types::MediaLocator;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// A stored blob
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMedia {
    /// Raw bytes
    pub data: Vec<u8>,
    /// MIME type
    pub mime_type: String,
}

/// Blob store keyed by generated IDs
#[derive(Debug, Default)]
pub struct MediaStore {
    blobs: RwLock<HashMap<String, StoredMedia>>,
}

impl MediaStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a blob and return its locator
    pub async fn put(&self, data: Vec<u8>, mime_type: impl Into<String>) -> MediaLocator {
        let id = Uuid::new_v4().to_string();
        let mime_type = mime_type.into();
        debug!(media_id = %id, mime_type = %mime_type, size = data.len(), "Stored media");
        self.blobs
            .write()
            .await
            .insert(id.clone(), StoredMedia { data, mime_type });
        MediaLocator(format!("{}{}", MEDIA_ROUTE_PREFIX, id))
    }

    /// Look up a blob by its ID
    pub async fn get(&self, id: &str) -> Option<StoredMedia> {
        self.blobs.read().await.get(id).cloned()
    }

    /// Look up a blob by its locator
    pub async fn resolve(&self, locator: &MediaLocator) -> Option<StoredMedia> {
        let id = Self::id_of(locator)?;
        self.get(id).await
    }

    /// Drop a blob
    pub async fn remove(&self, locator: &MediaLocator) -> bool {
        match Self::id_of(locator) {
            Some(id) => self.blobs.write().await.remove(id).is_some(),
            None => false,
        }
    }

    /// Number of stored blobs
    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }

    /// Whether the store is empty
    pub async fn is_empty(&self) -> bool {
        self.blobs.read().await.is_empty()
    }

    fn id_of(locator: &MediaLocator) -> Option<&str> {
        locator.as_str().strip_prefix(MEDIA_ROUTE_PREFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_and_resolve() {
        let store = MediaStore::new();
        let locator = store.put(vec![1, 2, 3], "image/png").await;
        assert!(locator.as_str().starts_with("/api/media/"));

        let media = store.resolve(&locator).await.unwrap();
        assert_eq!(media.data, vec![1, 2, 3]);
        assert_eq!(media.mime_type, "image/png");
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_resolve_unknown_locator() {
        let store = MediaStore::new();
        assert!(store
            .resolve(&MediaLocator("https://example.com/a.png".to_string()))
            .await
            .is_none());
        assert!(store
            .resolve(&MediaLocator("/api/media/missing".to_string()))
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_remove() {
        let store = MediaStore::new();
        let locator = store.put(vec![9], "video/mp4").await;
        assert!(store.remove(&locator).await);
        assert!(!store.remove(&locator).await);
        assert!(store.is_empty().await);
    }
}
