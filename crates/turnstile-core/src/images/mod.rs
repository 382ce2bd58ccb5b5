//! Image metadata collaborator
//!
//! The pipeline only needs pixel dimensions to estimate image tokens; raw
//! bytes stay with the image store.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

use crate::types::{ImageDimensions, ImageRef};

/// Resolves an attachment id to its dimensions
#[async_trait]
pub trait ImageMetadataSource: Send + Sync {
    /// `None` when the attachment is unknown or has no decodable size
    async fn dimensions(&self, attachment_id: &str) -> Option<ImageDimensions>;
}

/// Fill in missing dimensions of `images` from `source`
///
/// Dimensions already recorded on a reference are kept as is.
pub async fn resolve_dimensions(
    source: &dyn ImageMetadataSource,
    images: &[ImageRef],
) -> Vec<ImageRef> {
    let mut resolved = Vec::with_capacity(images.len());
    for image in images {
        let dimensions = match image.dimensions {
            Some(known) => Some(known),
            None => source.dimensions(&image.id).await,
        };
        if dimensions.is_none() {
            tracing::debug!(attachment = %image.id, "no dimensions for attachment");
        }
        resolved.push(ImageRef {
            id: image.id.clone(),
            dimensions,
        });
    }
    resolved
}

/// In-memory image metadata store
#[derive(Debug, Default)]
pub struct InMemoryImageStore {
    entries: RwLock<HashMap<String, ImageDimensions>>,
}

impl InMemoryImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, attachment_id: impl Into<String>, width: u32, height: u32) {
        self.entries
            .write()
            .insert(attachment_id.into(), ImageDimensions::new(width, height));
    }

    pub fn remove(&self, attachment_id: &str) -> Option<ImageDimensions> {
        self.entries.write().remove(attachment_id)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ImageMetadataSource for InMemoryImageStore {
    async fn dimensions(&self, attachment_id: &str) -> Option<ImageDimensions> {
        self.entries.read().get(attachment_id).copied()
    }
}

/// Source that knows no images; every attachment estimates to zero
#[derive(Debug, Default, Clone, Copy)]
pub struct NoImageMetadata;

#[async_trait]
impl ImageMetadataSource for NoImageMetadata {
    async fn dimensions(&self, _attachment_id: &str) -> Option<ImageDimensions> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_resolve_fills_missing_only() {
        let store = InMemoryImageStore::new();
        store.insert("a", 100, 200);
        store.insert("b", 1, 1);

        let images = vec![
            ImageRef::new("a"),
            ImageRef::new("b").with_dimensions(640, 480),
            ImageRef::new("missing"),
        ];
        let resolved = resolve_dimensions(&store, &images).await;

        assert_eq!(resolved[0].dimensions, Some(ImageDimensions::new(100, 200)));
        assert_eq!(resolved[1].dimensions, Some(ImageDimensions::new(640, 480)));
        assert_eq!(resolved[2].dimensions, None);
    }

    #[tokio::test]
    async fn test_no_metadata_source() {
        assert_eq!(NoImageMetadata.dimensions("x").await, None);
    }
}
