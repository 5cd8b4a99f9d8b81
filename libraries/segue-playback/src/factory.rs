//! Player construction, teardown and geometry

use segue_core::Track;

use crate::backend::{BackendFactory, SdkRegistry};
use crate::connectivity::Connectivity;
use crate::error::{PlaybackError, Result};
use crate::instance::PlayerInstance;
use crate::queue::QueueItem;
use crate::types::{PlaybackConfig, PlayerId, PlayerSize};

/// Pixel size for a track at a given width
///
/// Height follows the track's aspect ratio, or `default_aspect` while the
/// track's own is unknown or unusable.
pub fn player_size(track: &Track, width: u32, default_aspect: f64) -> PlayerSize {
    let aspect = track
        .aspect_ratio()
        .filter(|ratio| ratio.is_finite() && *ratio > 0.0)
        .unwrap_or(default_aspect);

    let height = (f64::from(width) / aspect).round().max(0.0) as u32;
    PlayerSize::new(width, height)
}

/// Creates and releases player instances
pub struct PlayerFactory {
    backends: Box<dyn BackendFactory>,
    sdk: SdkRegistry,
    connectivity: Connectivity,
    config: PlaybackConfig,
    next_id: u64,
}

impl std::fmt::Debug for PlayerFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerFactory")
            .field("sdk", &self.sdk)
            .field("next_id", &self.next_id)
            .finish_non_exhaustive()
    }
}

impl PlayerFactory {
    /// Create a factory over a backend factory
    pub fn new(
        backends: Box<dyn BackendFactory>,
        connectivity: Connectivity,
        config: PlaybackConfig,
    ) -> Self {
        Self {
            backends,
            sdk: SdkRegistry::new(),
            connectivity,
            config,
            next_id: 1,
        }
    }

    /// Connectivity handle shared with created players
    pub fn connectivity(&self) -> &Connectivity {
        &self.connectivity
    }

    /// SDKs initialised so far
    pub fn sdk_registry(&self) -> &SdkRegistry {
        &self.sdk
    }

    /// Geometry for `track` at `width`
    pub fn size_for(&self, track: &Track, width: u32) -> PlayerSize {
        player_size(track, width, self.config.default_aspect_ratio)
    }

    /// Create a player bound to `item`
    ///
    /// The player gets its geometry, has the track queued for loading and
    /// starts initialising. The caller owns the returned instance.
    pub fn create_player(&mut self, item: &QueueItem, width: u32) -> Result<PlayerInstance> {
        let track = item.track();
        let kind = track.provider();

        if !self.backends.supports(kind) {
            return Err(PlaybackError::UnsupportedProvider(kind));
        }

        let backend = self.backends.create(kind)?;
        let id = PlayerId(self.next_id);
        self.next_id += 1;

        let mut player = PlayerInstance::new(
            id,
            backend,
            self.sdk.clone(),
            self.connectivity.clone(),
            &self.config,
        );

        player.bind_track(std::sync::Arc::clone(track));
        player.set_size(self.size_for(track, width));
        player.preload(None);
        player.notify_view_ready();
        // Failures surface as `PlayerEvent::InitialisationFailed` on the next tick
        drop(player.initialise());

        tracing::debug!("Created {} for {} ({})", id, item.id(), kind);
        Ok(player)
    }

    /// Release a player's backend
    pub fn destroy_player(&mut self, mut player: PlayerInstance) {
        tracing::debug!("Destroying {}", player.id());
        player.de_initialise();
    }

    /// Whether `player` can be rebound to `item` instead of replaced
    pub fn can_reuse_player(&self, player: &PlayerInstance, item: &QueueItem) -> bool {
        let kind = item.track().provider();
        player.kind() == kind && self.backends.supports(kind)
    }
}
