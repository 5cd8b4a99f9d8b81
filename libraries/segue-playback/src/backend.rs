//! Media backend contract
//!
//! A [`PlayerBackend`] is the per-provider capability a player instance
//! drives: an embedded video SDK, a stream decoder, a simulated player in
//! tests. Commands are issued synchronously. Everything the backend learns
//! later (initialisation finished, media loaded, playback started, errors)
//! comes back as [`BackendEvent`]s through the sink handed to
//! [`PlayerBackend::attach`].

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use segue_core::{ProviderKind, Track};
use tokio::sync::mpsc;

use crate::error::Result;
use crate::types::PlayerSize;

/// Notification from a backend to its player instance
#[derive(Debug, Clone, PartialEq)]
pub enum BackendEvent {
    /// Pending SDK initialisation finished
    SdkReady,

    /// Pending player initialisation finished
    PlayerReady,

    /// Pending SDK or player initialisation failed
    InitFailed(String),

    /// Media duration became known
    DurationKnown(Duration),

    /// Playback position
    CurrentTime(Duration),

    /// Enough media buffered to start
    AbleToPlay,

    /// Buffering
    Waiting,

    /// Media loaded
    Ready,

    /// Playback started
    Playing,

    /// Playback paused
    Paused,

    /// Playback reached the end
    Ended,

    /// Playback stopped
    Stopped,

    /// Playback error with an optional reason
    Error(Option<String>),
}

impl BackendEvent {
    /// Whether the event belongs to the initialisation pipeline
    pub fn is_initialisation(&self) -> bool {
        matches!(
            self,
            BackendEvent::SdkReady | BackendEvent::PlayerReady | BackendEvent::InitFailed(_)
        )
    }
}

/// Channel end a backend reports through
pub type BackendEventSink = mpsc::UnboundedSender<BackendEvent>;

/// Outcome of an initialisation step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitProgress {
    /// Step finished synchronously
    Complete,

    /// Step finishes later with `SdkReady`/`PlayerReady` or `InitFailed`
    Pending,

    /// Step failed
    Failed(String),
}

/// Options for backend player creation
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlayerOptions {
    /// Initial surface size
    pub size: PlayerSize,
}

/// Provider-specific media player
pub trait PlayerBackend: Send {
    /// Provider this backend plays
    fn kind(&self) -> ProviderKind;

    /// Hand over the event sink; called once before initialisation
    fn attach(&mut self, sink: BackendEventSink);

    /// Load the provider SDK; called at most once per provider per factory
    fn initialise_sdk(&mut self) -> InitProgress;

    /// Create the player
    fn initialise_player(&mut self, options: &PlayerOptions) -> InitProgress;

    /// Release the player
    fn deinitialise_player(&mut self);

    /// Start reporting playback events
    fn bind_listeners(&mut self);

    /// Stop reporting playback events
    fn unbind_listeners(&mut self);

    /// Set output volume (0.0 to 1.0)
    fn set_volume(&mut self, volume: f32);

    /// Resize the player surface
    fn set_size(&mut self, size: PlayerSize);

    /// Start or resume playback
    fn start(&mut self);

    /// Pause playback
    fn pause(&mut self);

    /// Stop playback
    fn stop(&mut self);

    /// Jump to a position
    fn seek_to(&mut self, position: Duration);

    /// Load a track, optionally positioned at `start`
    fn preload(&mut self, track: &Track, start: Option<Duration>) -> Result<()>;
}

/// Creates backends for provider kinds
pub trait BackendFactory: Send {
    /// Whether this factory can create a backend for `kind`
    fn supports(&self, kind: ProviderKind) -> bool;

    /// Create a backend for `kind`
    fn create(&mut self, kind: ProviderKind) -> Result<Box<dyn PlayerBackend>>;
}

/// Provider SDKs already initialised
///
/// Shared by every player a factory creates, so an SDK is loaded once.
#[derive(Debug, Clone, Default)]
pub struct SdkRegistry {
    ready: Arc<Mutex<HashSet<ProviderKind>>>,
}

impl SdkRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the SDK for `kind` is loaded
    pub fn is_ready(&self, kind: ProviderKind) -> bool {
        self.ready
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&kind)
    }

    /// Record the SDK for `kind` as loaded
    pub fn mark_ready(&self, kind: ProviderKind) {
        let newly = self
            .ready
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(kind);
        if newly {
            tracing::debug!("{} SDK initialised", kind);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_is_shared_between_clones() {
        let registry = SdkRegistry::new();
        let other = registry.clone();

        assert!(!registry.is_ready(ProviderKind::Youtube));
        other.mark_ready(ProviderKind::Youtube);
        assert!(registry.is_ready(ProviderKind::Youtube));
        assert!(!registry.is_ready(ProviderKind::Soundcloud));
    }

    #[test]
    fn initialisation_events() {
        assert!(BackendEvent::SdkReady.is_initialisation());
        assert!(BackendEvent::InitFailed("x".into()).is_initialisation());
        assert!(!BackendEvent::Playing.is_initialisation());
    }
}
