//! Error types for playback orchestration

use crate::types::QueueItemStatus;
use segue_core::{ProviderKind, SegueError, TrackId};
use thiserror::Error;

/// Playback errors
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// Play was requested on a player with no track bound
    #[error("No track has been set to play")]
    NoTrackBound,

    /// SDK or backend player initialisation failed
    #[error("Initialisation failed: {0}")]
    Initialisation(String),

    /// Backend reported an error
    #[error("Backend error: {0}")]
    Backend(String),

    /// The player was torn down before the awaited status was reached
    #[error("Player was torn down before completing")]
    Detached,

    /// No queue item with this id
    #[error("Queue item not found: {0}")]
    ItemNotFound(TrackId),

    /// A queue item with this id already exists
    #[error("Queue item already present: {0}")]
    DuplicateItem(TrackId),

    /// Only `Requested*` statuses may be set from outside
    #[error("Status {0:?} cannot be requested directly")]
    InvalidStatusRequest(QueueItemStatus),

    /// No backend is registered for the provider
    #[error("No player backend for provider {0}")]
    UnsupportedProvider(ProviderKind),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Core error
    #[error(transparent)]
    Core(#[from] SegueError),
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
