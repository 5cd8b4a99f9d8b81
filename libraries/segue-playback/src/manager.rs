//! Player manager
//!
//! Binds the play queue to at most two live players: the *active* one that
//! is heard and an optional *upcoming* one preloaded for the next item.
//! Queue status requests decide whether a player is resumed, promoted,
//! reused or replaced. Time updates of the active player drive
//! prepare-ahead and the crossfade into the upcoming player.
//!
//! The manager is driven by [`PlayerManager::tick`]. Queue requests made
//! between ticks take effect on the next one.

use std::sync::Arc;
use std::time::{Duration, Instant};

use segue_core::{SharedTrack, TrackId};
use tracing::{debug, info, warn};

use crate::backend::BackendFactory;
use crate::connectivity::Connectivity;
use crate::error::Result;
use crate::events::{ManagerEvent, PlayerEvent};
use crate::factory::PlayerFactory;
use crate::instance::PlayerInstance;
use crate::queue::{PlayQueue, QueueEvent, QueueItem};
use crate::types::{PlaybackConfig, PlayerId, PlayerRole, PlayerStatus, QueueItemStatus};
use crate::volume::Volume;

/// Which player the queue listens to
#[derive(Debug, Clone)]
struct Binding {
    player: PlayerId,
    item: TrackId,
    /// Cleared when the crossfade fires
    crossfade_armed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CrossfadePhase {
    Idle,
    /// Upcoming told to play; fades start once it reports `Playing`
    Pending(Duration),
    Running(Duration),
}

/// Orchestrates the active/upcoming player pair
#[derive(Debug)]
pub struct PlayerManager {
    config: PlaybackConfig,
    queue: PlayQueue,
    factory: PlayerFactory,

    active: Option<PlayerInstance>,
    upcoming: Option<PlayerInstance>,
    binding: Option<Binding>,
    crossfade: CrossfadePhase,

    volume: Volume,
    player_width: u32,
    width_before_fullscreen: Option<u32>,

    player_status: PlayerStatus,
    has_error: bool,
    events: Vec<ManagerEvent>,
}

impl PlayerManager {
    /// Create a manager
    ///
    /// # Errors
    /// Returns `InvalidConfig` if the configuration does not validate
    pub fn new(
        config: PlaybackConfig,
        backends: Box<dyn BackendFactory>,
        connectivity: Connectivity,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            queue: PlayQueue::new(config.loop_queue),
            factory: PlayerFactory::new(backends, connectivity, config.clone()),
            active: None,
            upcoming: None,
            binding: None,
            crossfade: CrossfadePhase::Idle,
            volume: Volume::new(config.volume),
            player_width: config.player_width,
            width_before_fullscreen: None,
            player_status: PlayerStatus::NotInitialised,
            has_error: false,
            events: Vec::new(),
            config,
        })
    }

    // ===== Queue =====

    /// The play queue
    pub fn queue(&self) -> &PlayQueue {
        &self.queue
    }

    /// Mutable access to the play queue
    ///
    /// Changes are reacted to on the next tick.
    pub fn queue_mut(&mut self) -> &mut PlayQueue {
        &mut self.queue
    }

    /// Insert a track; `None` appends
    pub fn add(&mut self, track: SharedTrack, position: Option<usize>) -> Result<()> {
        self.queue.add(track, position).map(|_| ())
    }

    /// Append a track and request it to play
    pub fn add_and_play(&mut self, track: SharedTrack) -> Result<()> {
        self.queue.add_and_play(track)
    }

    /// Remove an item, tearing down any player bound to it first
    pub fn remove(&mut self, id: &TrackId) -> Result<()> {
        self.release_players_for(id);
        self.queue.remove(id).map(|_| ())
    }

    /// Request an item to play
    pub fn play(&mut self, id: &TrackId) -> Result<()> {
        self.queue.request_play(id)
    }

    /// Request an item to pause
    pub fn pause(&mut self, id: &TrackId) -> Result<()> {
        self.queue.request_pause(id)
    }

    /// Request an item to stop
    pub fn stop(&mut self, id: &TrackId) -> Result<()> {
        self.queue.request_stop(id)
    }

    /// Rewind an item and request it to play
    pub fn restart(&mut self, id: &TrackId) -> Result<()> {
        self.queue.restart(id)
    }

    /// Enable or disable wrap-around
    pub fn set_loop(&mut self, loop_queue: bool) {
        self.queue.set_loop(loop_queue);
    }

    /// Reconcile the queue with a fetched track list
    ///
    /// Players bound to items that disappear are torn down first.
    /// Returns `(added, removed)`.
    pub fn sync_queue(&mut self, tracks: &[SharedTrack]) -> (usize, usize) {
        let stale: Vec<TrackId> = self
            .queue
            .iter()
            .filter(|item| !tracks.iter().any(|t| t.id() == item.id()))
            .map(|item| item.id().clone())
            .collect();

        for id in &stale {
            self.release_players_for(id);
        }

        self.queue.sync_with(tracks)
    }

    // ===== Volume =====

    /// Set the volume (0-100)
    pub fn set_volume(&mut self, level: u8) {
        self.volume.set_level(level);
        self.apply_volume();
    }

    /// Current volume
    pub fn volume(&self) -> &Volume {
        &self.volume
    }

    /// Mute without losing the level
    pub fn mute(&mut self) {
        self.volume.mute();
        self.apply_volume();
    }

    /// Restore the level
    pub fn unmute(&mut self) {
        self.volume.unmute();
        self.apply_volume();
    }

    // ===== Geometry =====

    /// Shared player width
    pub fn player_width(&self) -> u32 {
        self.player_width
    }

    /// Change the shared player width and resize live players
    pub fn set_player_width(&mut self, width: u32) {
        if width == 0 || width == self.player_width {
            return;
        }
        self.player_width = width;
        self.refresh_geometry();
    }

    /// Take the full display width, remembering the current one
    pub fn enter_fullscreen(&mut self, display_width: u32) {
        if self.width_before_fullscreen.is_none() {
            self.width_before_fullscreen = Some(self.player_width);
        }
        self.set_player_width(display_width);
    }

    /// Restore the width from before fullscreen
    pub fn leave_fullscreen(&mut self) {
        if let Some(width) = self.width_before_fullscreen.take() {
            self.set_player_width(width);
        }
    }

    /// Whether fullscreen is active
    pub fn is_fullscreen(&self) -> bool {
        self.width_before_fullscreen.is_some()
    }

    /// Recompute and apply player sizes
    ///
    /// Call after track metadata (aspect ratio) has been filled in.
    pub fn refresh_geometry(&mut self) {
        let width = self.player_width;
        for player in [self.active.as_mut(), self.upcoming.as_mut()]
            .into_iter()
            .flatten()
        {
            if let Some(track) = player.track().cloned() {
                player.set_size(self.factory.size_for(&track, width));
            }
        }
    }

    /// Height the host should give the player container
    pub fn controller_height(&self) -> Option<u32> {
        let track = self.active.as_ref()?.track()?;
        Some(self.factory.size_for(track, self.player_width).height)
    }

    // ===== State =====

    /// The audible player
    pub fn active(&self) -> Option<&PlayerInstance> {
        self.active.as_ref()
    }

    /// The player prepared for the next item
    pub fn upcoming(&self) -> Option<&PlayerInstance> {
        self.upcoming.as_ref()
    }

    /// Number of live players (never more than two)
    pub fn live_player_count(&self) -> usize {
        usize::from(self.active.is_some()) + usize::from(self.upcoming.is_some())
    }

    /// Item the active player is bound to
    pub fn selected_track(&self) -> Option<&TrackId> {
        self.binding.as_ref().map(|binding| &binding.item)
    }

    /// Last status reported by the active player
    pub fn player_status(&self) -> PlayerStatus {
        self.player_status
    }

    /// Whether the active player reported an error since it last played
    pub fn has_error(&self) -> bool {
        self.has_error
    }

    /// Whether a crossfade is in progress
    pub fn is_crossfading(&self) -> bool {
        self.crossfade != CrossfadePhase::Idle
    }

    /// Connectivity handle shared with the players
    pub fn connectivity(&self) -> &Connectivity {
        self.factory.connectivity()
    }

    /// Take the pending events
    pub fn drain_events(&mut self) -> Vec<ManagerEvent> {
        std::mem::take(&mut self.events)
    }

    /// Crossfade length for the current pair
    ///
    /// The configured length, capped at half of either duration. `None`
    /// until both durations are known.
    pub fn fade_duration(&self) -> Option<Duration> {
        let active = self.active.as_ref()?.duration()?;
        let upcoming = self.upcoming.as_ref()?.duration()?;

        Some(self.config.fade_length().min(active / 2).min(upcoming / 2))
    }

    /// Position of the active player at which the crossfade starts
    pub fn fade_start_time(&self) -> Option<Duration> {
        let active = self.active.as_ref()?.duration()?;
        Some(active.saturating_sub(self.fade_duration()?))
    }

    // ===== Driving =====

    /// Advance the manager
    ///
    /// Reacts to queue changes, processes player reports and advances
    /// fades.
    pub fn tick(&mut self, now: Instant) {
        self.dispatch_queue_events();

        if let Some(active) = self.active.as_mut() {
            let player = active.id();
            for event in active.tick(now) {
                if self.active.as_ref().map(PlayerInstance::id) != Some(player) {
                    break;
                }
                self.on_active_event(event, now);
                self.dispatch_queue_events();
            }
        }

        if let Some(upcoming) = self.upcoming.as_mut() {
            let player = upcoming.id();
            for event in upcoming.tick(now) {
                if self.upcoming.as_ref().map(PlayerInstance::id) != Some(player) {
                    break;
                }
                self.on_upcoming_event(event, now);
            }
        }

        if matches!(self.crossfade, CrossfadePhase::Running(_))
            && !self.active.as_ref().is_some_and(PlayerInstance::is_fading)
            && !self.upcoming.as_ref().is_some_and(PlayerInstance::is_fading)
        {
            debug!("Crossfade finished");
            self.crossfade = CrossfadePhase::Idle;
        }

        self.dispatch_queue_events();
    }

    fn dispatch_queue_events(&mut self) {
        loop {
            let events = self.queue.drain_events();
            if events.is_empty() {
                return;
            }

            for event in events {
                match event {
                    QueueEvent::Added(_) => self.activate_initial_item(),
                    QueueEvent::Removed(id) => self.release_players_for(&id),
                    QueueEvent::StatusChanged { id, status } => match status {
                        QueueItemStatus::RequestedPlaying => self.start_player_for(&id),
                        QueueItemStatus::RequestedPause => self.pause_player(&id),
                        QueueItemStatus::RequestedStop => self.stop_player(&id),
                        _ => {}
                    },
                }
            }
        }
    }

    // ===== Player selection =====

    fn start_player_for(&mut self, id: &TrackId) {
        let Some(item) = self.queue.get(id).cloned() else {
            return;
        };
        let gain = self.volume.gain();

        // Resume the bound player
        if let Some(active) = self.active.as_mut() {
            if active.track_id() == Some(id) {
                let from = (active.status() == PlayerStatus::Ended).then_some(Duration::ZERO);
                debug!("Resuming {} on {}", id, active.id());
                active.set_volume(gain);
                drop(active.play(from));
                return;
            }
        }

        // Promote the prepared player
        if self
            .upcoming
            .as_ref()
            .is_some_and(|up| up.track_id() == Some(id) && up.is_able_to_play())
        {
            if let Some(upcoming) = self.upcoming.take() {
                info!("Promoting {} for {}", upcoming.id(), id);
                self.retire_active();
                self.activate(upcoming, &item, true);
            }
            return;
        }

        // Rebind the active player in place
        let reusable = self
            .active
            .as_ref()
            .is_some_and(|active| self.factory.can_reuse_player(active, &item));
        if reusable {
            if let Some(upcoming) = self.upcoming.take() {
                self.factory.destroy_player(upcoming);
            }
            if let Some(previous) = self.binding.take() {
                self.settle_stopped(&previous.item);
            }
            if let Some(mut active) = self.active.take() {
                info!("Reusing {} for {}", active.id(), id);
                active.cancel_fade();
                active.update_track(Arc::clone(item.track()));
                self.activate(active, &item, true);
            }
            return;
        }

        // Replace both players
        match self.factory.create_player(&item, self.player_width) {
            Ok(player) => {
                info!("Starting {} for {}", player.id(), id);
                self.retire_active();
                if let Some(upcoming) = self.upcoming.take() {
                    self.factory.destroy_player(upcoming);
                }
                self.activate(player, &item, true);
            }
            Err(e) => {
                warn!("Could not create a player for {}: {}", id, e);
                self.surface_error(e.to_string());
                let _ = self.queue.set_status(id, QueueItemStatus::Paused);
            }
        }
    }

    fn activate(&mut self, mut player: PlayerInstance, item: &QueueItem, can_play: bool) {
        self.crossfade = CrossfadePhase::Idle;

        player.set_role(PlayerRole::Active);
        player.set_size(self.factory.size_for(item.track(), self.player_width));

        if can_play {
            player.set_volume(self.volume.gain());
            drop(player.play(None));
        } else {
            player.set_volume(0.0);
            if !item.progress().is_zero() {
                drop(player.seek_to(item.progress()));
            }
        }

        let changed = self.selected_track() != Some(item.id());
        self.binding = Some(Binding {
            player: player.id(),
            item: item.id().clone(),
            crossfade_armed: true,
        });

        if let Some(duration) = player.duration() {
            let _ = self.queue.set_duration(item.id(), duration);
        }
        let status = player.status();
        self.active = Some(player);

        if status == PlayerStatus::Playing {
            self.on_player_status(item.id(), status);
        }

        if changed {
            self.events.push(ManagerEvent::SelectedTrackChanged {
                track: Some(item.id().clone()),
            });
        }
    }

    fn activate_initial_item(&mut self) {
        if self.active.is_some() {
            return;
        }

        let Some(item) = self
            .queue
            .playing_item()
            .or_else(|| self.queue.paused_item())
            .cloned()
        else {
            return;
        };

        if self.upcoming.as_ref().and_then(|p| p.track_id()) == Some(item.id()) {
            if let Some(upcoming) = self.upcoming.take() {
                self.factory.destroy_player(upcoming);
            }
            self.crossfade = CrossfadePhase::Idle;
        }

        match self.factory.create_player(&item, self.player_width) {
            Ok(player) => {
                debug!("Activating {} for {} without playing", player.id(), item.id());
                self.activate(player, &item, false);
            }
            Err(e) => warn!("Could not create a player for {}: {}", item.id(), e),
        }
    }

    fn retire_active(&mut self) {
        if let Some(previous) = self.binding.take() {
            self.settle_stopped(&previous.item);
        }
        if let Some(active) = self.active.take() {
            self.factory.destroy_player(active);
        }
        self.crossfade = CrossfadePhase::Idle;
    }

    fn release_players_for(&mut self, id: &TrackId) {
        if self.upcoming.as_ref().and_then(|p| p.track_id()) == Some(id) {
            if let Some(upcoming) = self.upcoming.take() {
                debug!("Releasing upcoming {} for removed {}", upcoming.id(), id);
                self.factory.destroy_player(upcoming);
            }
            self.restore_active_after_crossfade();
        }

        let bound = self.binding.as_ref().is_some_and(|b| &b.item == id)
            || self.active.as_ref().and_then(|p| p.track_id()) == Some(id);
        if bound {
            self.binding = None;
            if let Some(active) = self.active.take() {
                debug!("Releasing active {} for removed {}", active.id(), id);
                self.factory.destroy_player(active);
            }
            self.crossfade = CrossfadePhase::Idle;
            self.player_status = PlayerStatus::NotInitialised;
            self.events
                .push(ManagerEvent::SelectedTrackChanged { track: None });
        }
    }

    fn settle_stopped(&mut self, id: &TrackId) {
        let engaged = self.queue.get(id).is_some_and(|item| {
            item.status().is_engaged() || item.status() == QueueItemStatus::RequestedStop
        });
        if engaged {
            let _ = self.queue.set_status(id, QueueItemStatus::Stopped);
        }
    }

    // ===== Requests =====

    fn pause_player(&mut self, id: &TrackId) {
        let gain = self.volume.gain();
        let bound = self.active.as_ref().and_then(|p| p.track_id()) == Some(id);

        if !bound {
            let _ = self.queue.set_status(id, QueueItemStatus::Paused);
            return;
        }

        if let Some(upcoming) = self.upcoming.as_mut() {
            upcoming.cancel_fade();
            drop(upcoming.stop());
            upcoming.set_volume(0.0);
        }

        if let Some(binding) = self.binding.as_mut() {
            binding.crossfade_armed = true;
        }
        self.crossfade = CrossfadePhase::Idle;

        if let Some(active) = self.active.as_mut() {
            active.cancel_fade();
            active.set_volume(gain);
            drop(active.pause());

            if matches!(
                active.status(),
                PlayerStatus::Paused
                    | PlayerStatus::Stopped
                    | PlayerStatus::Ended
                    | PlayerStatus::NotInitialised
                    | PlayerStatus::Error
            ) {
                let _ = self.queue.set_status(id, QueueItemStatus::Paused);
            }
        }
    }

    fn stop_player(&mut self, id: &TrackId) {
        let Some(active) = self
            .active
            .as_mut()
            .filter(|p| p.track_id() == Some(id))
        else {
            let _ = self.queue.set_status(id, QueueItemStatus::Stopped);
            return;
        };

        drop(active.stop());
        if matches!(
            active.status(),
            PlayerStatus::Stopped | PlayerStatus::Ended | PlayerStatus::NotInitialised
        ) {
            let _ = self.queue.set_status(id, QueueItemStatus::Stopped);
        }
    }

    // ===== Player reports =====

    fn on_active_event(&mut self, event: PlayerEvent, now: Instant) {
        let Some(item) = self.bound_item() else {
            return;
        };

        match event {
            PlayerEvent::StatusChanged(status) => self.on_player_status(&item, status),
            PlayerEvent::DurationChanged(duration) => {
                let _ = self.queue.set_duration(&item, duration);
            }
            PlayerEvent::CurrentTimeChanged(time) => {
                let _ = self.queue.set_progress(&item, time);
                self.prepare_next(&item, time);
                self.maybe_crossfade(time, now);
            }
            PlayerEvent::MetadataRequested(track) => {
                self.events.push(ManagerEvent::MetadataRequested { track });
            }
            PlayerEvent::InitialisationFailed(message) => {
                self.surface_error(message);
                let _ = self.queue.set_status(&item, QueueItemStatus::Paused);
            }
        }
    }

    fn on_upcoming_event(&mut self, event: PlayerEvent, now: Instant) {
        match event {
            PlayerEvent::StatusChanged(PlayerStatus::Playing) => {
                if let CrossfadePhase::Pending(fade) = self.crossfade {
                    self.begin_crossfade(fade, now);
                }
            }
            PlayerEvent::DurationChanged(duration) => {
                if let Some(id) = self.upcoming.as_ref().and_then(|p| p.track_id()).cloned() {
                    let _ = self.queue.set_duration(&id, duration);
                }
            }
            PlayerEvent::MetadataRequested(track) => {
                self.events.push(ManagerEvent::MetadataRequested { track });
            }
            PlayerEvent::InitialisationFailed(message) => {
                warn!("Upcoming player failed to initialise: {}", message);
                if let Some(upcoming) = self.upcoming.take() {
                    self.factory.destroy_player(upcoming);
                }
                self.restore_active_after_crossfade();
            }
            _ => {}
        }
    }

    fn on_player_status(&mut self, item: &TrackId, status: PlayerStatus) {
        self.player_status = status;
        self.events
            .push(ManagerEvent::PlayerStatusChanged { status });

        match status {
            PlayerStatus::Playing => {
                self.has_error = false;
                let _ = self.queue.set_status(item, QueueItemStatus::Playing);
            }
            PlayerStatus::Paused => {
                let _ = self.queue.set_status(item, QueueItemStatus::Paused);
            }
            PlayerStatus::Stopped => {
                let _ = self.queue.set_status(item, QueueItemStatus::Stopped);
            }
            PlayerStatus::Ended => self.advance_after(item),
            PlayerStatus::Error => {
                let message = self
                    .active
                    .as_ref()
                    .and_then(|p| p.error())
                    .unwrap_or("Unknown playback error")
                    .to_string();
                self.surface_error(message);
                let _ = self.queue.request_pause(item);
            }
            _ => {}
        }
    }

    fn advance_after(&mut self, item: &TrackId) {
        let _ = self.queue.set_status(item, QueueItemStatus::Ended);

        let next = self.queue.next_after(item).map(|next| next.id().clone());
        match next {
            Some(next) if &next == item => {
                info!("Restarting {}", item);
                let _ = self.queue.restart(item);
            }
            Some(next) => {
                info!("{} ended, playing {}", item, next);
                let _ = self.queue.request_play(&next);
            }
            None => {
                info!("{} ended, end of queue", item);
                let _ = self.queue.request_stop(item);
            }
        }
    }

    // ===== Prepare-ahead and crossfade =====

    fn prepare_next(&mut self, item: &TrackId, time: Duration) {
        if self
            .upcoming
            .as_ref()
            .is_some_and(|up| up.status() == PlayerStatus::Playing)
        {
            return;
        }

        let Some(duration) = self.active.as_ref().and_then(PlayerInstance::duration) else {
            return;
        };
        if duration.saturating_sub(time) > self.config.prepare_window() {
            return;
        }

        let Some(next) = self.queue.next_after(item).cloned() else {
            return;
        };
        if next.id() == item {
            return;
        }
        if self.upcoming.as_ref().and_then(|p| p.track_id()) == Some(next.id()) {
            return;
        }

        if let Some(stale) = self.upcoming.take() {
            debug!("Dropping stale upcoming {}", stale.id());
            self.factory.destroy_player(stale);
        }

        match self.factory.create_player(&next, self.player_width) {
            Ok(mut player) => {
                player.set_role(PlayerRole::Upcoming);
                player.set_volume(0.0);
                info!("Prepared {} for {}", player.id(), next.id());
                self.events.push(ManagerEvent::NextPlayerPrepared {
                    player: player.id(),
                    track: next.id().clone(),
                });
                self.upcoming = Some(player);
            }
            Err(e) => warn!("Could not prepare a player for {}: {}", next.id(), e),
        }
    }

    fn maybe_crossfade(&mut self, time: Duration, now: Instant) {
        if !self.binding.as_ref().is_some_and(|b| b.crossfade_armed) {
            return;
        }
        let (Some(start), Some(fade), Some(total)) = (
            self.fade_start_time(),
            self.fade_duration(),
            self.active.as_ref().and_then(PlayerInstance::duration),
        ) else {
            return;
        };
        if time < start {
            return;
        }
        // A late trigger only has the rest of the track to fade over
        let fade = fade.min(total.saturating_sub(time));
        let Some(upcoming) = self.upcoming.as_mut() else {
            return;
        };
        if !upcoming.is_able_to_play() {
            return;
        }

        if let Some(binding) = self.binding.as_mut() {
            binding.crossfade_armed = false;
        }

        debug!("Crossfade triggered at {:?}, fading over {:?}", time, fade);
        drop(upcoming.play(None));

        if upcoming.status() == PlayerStatus::Playing {
            self.begin_crossfade(fade, now);
        } else {
            self.crossfade = CrossfadePhase::Pending(fade);
        }
    }

    fn begin_crossfade(&mut self, fade: Duration, now: Instant) {
        let gain = self.volume.gain();
        let width = self.player_width;

        let Some(upcoming) = self.upcoming.as_mut() else {
            self.crossfade = CrossfadePhase::Idle;
            return;
        };
        if let Some(track) = upcoming.track().cloned() {
            upcoming.set_size(self.factory.size_for(&track, width));
        }
        upcoming.set_volume(gain);
        upcoming.fade_in(fade, now);
        let to = upcoming.track_id().cloned();

        if let Some(active) = self.active.as_mut() {
            active.fade_out(fade, now);
        }

        self.crossfade = CrossfadePhase::Running(fade);

        if let (Some(from), Some(to)) = (self.bound_item(), to) {
            info!("Crossfading {} -> {} over {:?}", from, to, fade);
            self.events.push(ManagerEvent::CrossfadeStarted {
                from,
                to,
                duration_ms: fade.as_millis() as u64,
            });
        }
    }

    // ===== Helpers =====

    fn bound_item(&self) -> Option<TrackId> {
        let binding = self.binding.as_ref()?;
        let active = self.active.as_ref()?;
        (active.id() == binding.player).then(|| binding.item.clone())
    }

    /// Undo a crossfade that lost its upcoming player
    fn restore_active_after_crossfade(&mut self) {
        if self.crossfade == CrossfadePhase::Idle {
            return;
        }
        self.crossfade = CrossfadePhase::Idle;

        let gain = self.volume.gain();
        if let Some(active) = self.active.as_mut() {
            active.cancel_fade();
            active.set_volume(gain);
        }
        if let Some(binding) = self.binding.as_mut() {
            binding.crossfade_armed = true;
        }
    }

    fn apply_volume(&mut self) {
        let gain = self.volume.gain();
        if let Some(active) = self.active.as_mut() {
            active.set_volume(gain);
        }
        let fading_in = self.crossfade != CrossfadePhase::Idle;
        if let Some(upcoming) = self.upcoming.as_mut() {
            if fading_in || upcoming.status() == PlayerStatus::Playing {
                upcoming.set_volume(gain);
            }
        }
    }

    fn surface_error(&mut self, message: String) {
        self.has_error = true;
        self.events.push(ManagerEvent::Error { message });
    }
}

impl Drop for PlayerManager {
    fn drop(&mut self) {
        if let Some(upcoming) = self.upcoming.take() {
            self.factory.destroy_player(upcoming);
        }
        if let Some(active) = self.active.take() {
            self.factory.destroy_player(active);
        }
    }
}
