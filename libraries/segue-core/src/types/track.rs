/// Track domain type
use crate::error::Result;
use crate::traits::TrackProvider;
use crate::types::TrackId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

/// Shared handle to a track
///
/// Queue items and players hold the same `Track`; metadata filled in by a
/// provider becomes visible to every holder.
pub type SharedTrack = Arc<Track>;

/// Media provider a track is streamed from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// YouTube live streams and videos
    Youtube,
    /// SoundCloud tracks
    Soundcloud,
    /// Plain HTTP media streams
    Stream,
}

impl ProviderKind {
    /// Lowercase provider name
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Youtube => "youtube",
            ProviderKind::Soundcloud => "soundcloud",
            ProviderKind::Stream => "stream",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a track was recorded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    /// Human readable place name
    pub title: Option<String>,

    /// Latitude in degrees
    pub latitude: f64,

    /// Longitude in degrees
    pub longitude: f64,
}

/// Mutable track metadata supplied by a provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackMetadata {
    /// Track title
    pub title: Option<String>,

    /// Track duration
    pub duration: Option<Duration>,

    /// Width / height of the video surface
    pub aspect_ratio: Option<f64>,

    /// Recording location
    pub location: Option<GeoLocation>,
}

impl TrackMetadata {
    /// Check if metadata has any useful information
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.duration.is_none()
            && self.aspect_ratio.is_none()
            && self.location.is_none()
    }
}

/// A remotely streamed track
///
/// The id and provider never change once created. Metadata sits behind a
/// lock so a provider lookup can fill it in while players hold the track.
#[derive(Debug)]
pub struct Track {
    id: TrackId,
    provider: ProviderKind,
    metadata: RwLock<TrackMetadata>,
}

impl Track {
    /// Create a track with no metadata yet
    pub fn new(id: impl Into<TrackId>, provider: ProviderKind) -> Self {
        Self::with_metadata(id, provider, TrackMetadata::default())
    }

    /// Create a track with known metadata
    pub fn with_metadata(
        id: impl Into<TrackId>,
        provider: ProviderKind,
        metadata: TrackMetadata,
    ) -> Self {
        Self {
            id: id.into(),
            provider,
            metadata: RwLock::new(metadata),
        }
    }

    /// Wrap into a shared handle
    pub fn shared(self) -> SharedTrack {
        Arc::new(self)
    }

    /// Stable track identifier
    pub fn id(&self) -> &TrackId {
        &self.id
    }

    /// Provider this track streams from
    pub fn provider(&self) -> ProviderKind {
        self.provider
    }

    /// Snapshot of the current metadata
    pub fn metadata(&self) -> TrackMetadata {
        self.read().clone()
    }

    /// Track title, if known
    pub fn title(&self) -> Option<String> {
        self.read().title.clone()
    }

    /// Track duration, if known
    pub fn duration(&self) -> Option<Duration> {
        self.read().duration
    }

    /// Aspect ratio, if known
    pub fn aspect_ratio(&self) -> Option<f64> {
        self.read().aspect_ratio
    }

    /// Recording location, if known
    pub fn location(&self) -> Option<GeoLocation> {
        self.read().location.clone()
    }

    /// Whether a provider lookup is still needed
    pub fn needs_metadata(&self) -> bool {
        self.read().title.is_none()
    }

    /// Merge fetched metadata into the track
    ///
    /// Fields absent from `update` keep their current value.
    pub fn apply_metadata(&self, update: TrackMetadata) {
        let mut metadata = self.write();
        if update.title.is_some() {
            metadata.title = update.title;
        }
        if update.duration.is_some() {
            metadata.duration = update.duration;
        }
        if update.aspect_ratio.is_some() {
            metadata.aspect_ratio = update.aspect_ratio;
        }
        if update.location.is_some() {
            metadata.location = update.location;
        }
    }

    /// Populate missing metadata from a provider
    ///
    /// # Errors
    /// Returns the provider error; the track is left untouched in that case
    pub async fn fetch(&self, provider: &dyn TrackProvider) -> Result<()> {
        let metadata = provider.fetch(&self.id).await?;
        tracing::debug!("Fetched metadata for track {}", self.id);
        self.apply_metadata(metadata);
        Ok(())
    }

    fn read(&self) -> RwLockReadGuard<'_, TrackMetadata> {
        self.metadata.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, TrackMetadata> {
        self.metadata.write().unwrap_or_else(PoisonError::into_inner)
    }
}
