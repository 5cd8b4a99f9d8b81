//! In-memory track provider
//!
//! Serves metadata from a catalog held in memory. Used by the channel player
//! for configured channels and by tests.

use crate::error::{Result, SegueError};
use crate::traits::TrackProvider;
use crate::types::{ProviderKind, TrackId, TrackMetadata};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Catalog-backed `TrackProvider`
#[derive(Debug)]
pub struct MemoryTrackProvider {
    kind: ProviderKind,
    catalog: RwLock<HashMap<TrackId, TrackMetadata>>,
}

impl MemoryTrackProvider {
    /// Create an empty catalog for a provider kind
    pub fn new(kind: ProviderKind) -> Self {
        Self {
            kind,
            catalog: RwLock::new(HashMap::new()),
        }
    }

    /// Add or replace a catalog entry
    pub fn insert(&self, id: impl Into<TrackId>, metadata: TrackMetadata) {
        self.catalog
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.into(), metadata);
    }

    /// Number of catalog entries
    pub fn len(&self) -> usize {
        self.catalog
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Check if the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl TrackProvider for MemoryTrackProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    async fn fetch(&self, id: &TrackId) -> Result<TrackMetadata> {
        self.catalog
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
            .ok_or_else(|| SegueError::TrackNotFound(id.clone()))
    }
}
