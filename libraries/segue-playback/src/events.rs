//! Events reported by players and the player manager

use std::time::Duration;

use segue_core::TrackId;
use serde::{Deserialize, Serialize};

use crate::types::{PlayerId, PlayerStatus};

/// Notification from a player instance, returned by
/// [`PlayerInstance::tick`](crate::PlayerInstance::tick)
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    /// Status changed
    StatusChanged(PlayerStatus),

    /// Duration became known
    DurationChanged(Duration),

    /// Playback position (throttled)
    CurrentTimeChanged(Duration),

    /// Initialisation finished but the bound track has no title yet
    MetadataRequested(TrackId),

    /// Initialisation failed; call `initialise` again to retry
    InitialisationFailed(String),
}

/// Event emitted by the player manager for the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ManagerEvent {
    /// Active player status changed
    PlayerStatusChanged {
        /// New status
        status: PlayerStatus,
    },

    /// The active player now plays a different item (or none)
    SelectedTrackChanged {
        /// Bound item, if any
        track: Option<TrackId>,
    },

    /// Crossfade between the active and upcoming players began
    CrossfadeStarted {
        /// Outgoing item
        from: TrackId,
        /// Incoming item
        to: TrackId,
        /// Fade length in milliseconds
        duration_ms: u64,
    },

    /// Upcoming player created for the next item
    NextPlayerPrepared {
        /// Player id
        player: PlayerId,
        /// Item it is bound to
        track: TrackId,
    },

    /// A track needs its metadata fetched
    MetadataRequested {
        /// Track to fetch
        track: TrackId,
    },

    /// Error surfaced from a player
    Error {
        /// Error message
        message: String,
    },
}
