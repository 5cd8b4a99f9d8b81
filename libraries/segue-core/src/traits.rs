/// Core traits for Segue
use crate::error::Result;
use crate::types::{ProviderKind, TrackId, TrackMetadata};
use async_trait::async_trait;

/// Track provider trait
///
/// Implementers look up track metadata (title, duration, aspect ratio,
/// location) for tracks whose queue entry was created from an id only.
/// Search and ranking live outside of this contract.
#[async_trait]
pub trait TrackProvider: Send + Sync {
    /// The media provider this lookup serves
    fn kind(&self) -> ProviderKind;

    /// Fetch metadata for a single track
    ///
    /// # Errors
    /// Returns an error if the track is unknown or the lookup fails
    async fn fetch(&self, id: &TrackId) -> Result<TrackMetadata>;
}
