//! Player lifecycle state machine
//!
//! A [`PlayerInstance`] wraps one [`PlayerBackend`] and owns everything the
//! backend does not: the initialisation pipeline, operations queued until
//! initialisation completes, status waiters, the forced-start retry policy,
//! offline recovery, throttled time reporting and volume fades.
//!
//! Nothing here blocks. Operations return a [`Completion`] that resolves
//! when the backend reports the matching status. Backend reports are
//! processed by [`PlayerInstance::tick`], which also hands back the
//! resulting [`PlayerEvent`]s.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use segue_core::{ProviderKind, SharedTrack, TrackId};
use tokio::sync::{mpsc, watch};

use crate::backend::{BackendEvent, InitProgress, PlayerBackend, PlayerOptions, SdkRegistry};
use crate::completion::{Completion, Resolver, StatusWaiter};
use crate::connectivity::Connectivity;
use crate::ease::{Ease, EaseSampler};
use crate::error::PlaybackError;
use crate::events::PlayerEvent;
use crate::throttle::Throttle;
use crate::types::{PlaybackConfig, PlayerId, PlayerRole, PlayerSize, PlayerStatus};

/// Ordered initialisation steps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitStep {
    /// Wait for the hosting view to exist
    WaitForView,
    /// Load the provider SDK (once per provider)
    InitialiseSdk,
    /// Create the backend player
    InitialisePlayer,
}

const INIT_STEPS: [InitStep; 3] = [
    InitStep::WaitForView,
    InitStep::InitialiseSdk,
    InitStep::InitialisePlayer,
];

#[derive(Debug, Default)]
struct InitPipeline {
    started: bool,
    steps: VecDeque<InitStep>,
    in_flight: Option<InitStep>,
    waiters: Vec<Resolver<()>>,
}

impl InitPipeline {
    fn reset(&mut self) {
        self.started = false;
        self.steps.clear();
        self.in_flight = None;
    }
}

/// Backend command held back until the player can take it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlayerOp {
    Preload { start: Option<Duration> },
    Start { from: Option<Duration> },
    Seek(Duration),
    Pause,
    Stop,
}

struct StatusWait {
    wanted: Vec<PlayerStatus>,
    resolver: Resolver<PlayerStatus>,
}

/// One live player bound to one track
pub struct PlayerInstance {
    id: PlayerId,
    kind: ProviderKind,
    backend: Box<dyn PlayerBackend>,
    backend_events: mpsc::UnboundedReceiver<BackendEvent>,
    sdk: SdkRegistry,
    connectivity: Connectivity,

    track: Option<SharedTrack>,
    role: PlayerRole,
    status: PlayerStatus,
    error: Option<String>,
    duration: Option<Duration>,
    current_time: Duration,
    able_to_play: bool,

    /// Base volume (0.0 to 1.0)
    volume: f32,
    /// Last value written (or to be written) to the backend
    output_volume: f32,
    size: Option<PlayerSize>,

    view_ready: bool,
    initialised: bool,
    listeners_bound: bool,
    init: InitPipeline,
    deferred: Vec<PlayerOp>,

    awaiting_update_stop: bool,
    after_update: Vec<PlayerOp>,

    allowed_to_play: bool,
    force_start: bool,
    forced_start_attempts: u32,
    max_forced_start_attempts: u32,

    waiters: Vec<StatusWait>,
    time_updates: Throttle<Duration>,
    reconnect: Option<watch::Receiver<bool>>,
    fade: Option<EaseSampler>,
    outgoing: Vec<PlayerEvent>,
}

impl std::fmt::Debug for PlayerInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerInstance")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("track", &self.track_id())
            .field("role", &self.role)
            .field("status", &self.status)
            .field("initialised", &self.initialised)
            .finish_non_exhaustive()
    }
}

impl PlayerInstance {
    /// Create a player around a backend
    ///
    /// The backend is attached to a fresh event channel. Nothing is
    /// initialised until [`initialise`](Self::initialise) is called.
    pub fn new(
        id: PlayerId,
        mut backend: Box<dyn PlayerBackend>,
        sdk: SdkRegistry,
        connectivity: Connectivity,
        config: &PlaybackConfig,
    ) -> Self {
        let (sink, backend_events) = mpsc::unbounded_channel();
        backend.attach(sink);

        Self {
            id,
            kind: backend.kind(),
            backend,
            backend_events,
            sdk,
            connectivity,
            track: None,
            role: PlayerRole::Detached,
            status: PlayerStatus::NotInitialised,
            error: None,
            duration: None,
            current_time: Duration::ZERO,
            able_to_play: false,
            volume: 1.0,
            output_volume: 1.0,
            size: None,
            view_ready: false,
            initialised: false,
            listeners_bound: false,
            init: InitPipeline::default(),
            deferred: Vec::new(),
            awaiting_update_stop: false,
            after_update: Vec::new(),
            allowed_to_play: false,
            force_start: false,
            forced_start_attempts: 0,
            max_forced_start_attempts: config.max_forced_start_attempts,
            waiters: Vec::new(),
            time_updates: Throttle::new(config.time_update_interval()),
            reconnect: None,
            fade: None,
            outgoing: Vec::new(),
        }
    }

    /// Player id
    pub fn id(&self) -> PlayerId {
        self.id
    }

    /// Provider of the wrapped backend
    pub fn kind(&self) -> ProviderKind {
        self.kind
    }

    /// Bound track
    pub fn track(&self) -> Option<&SharedTrack> {
        self.track.as_ref()
    }

    /// Id of the bound track (and queue item)
    pub fn track_id(&self) -> Option<&TrackId> {
        self.track.as_ref().map(|track| track.id())
    }

    /// Role in the active/upcoming pair
    pub fn role(&self) -> PlayerRole {
        self.role
    }

    /// Change role
    pub fn set_role(&mut self, role: PlayerRole) {
        self.role = role;
    }

    /// Current status
    pub fn status(&self) -> PlayerStatus {
        self.status
    }

    /// Last backend error message
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Duration reported by the backend
    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    /// Last known playback position
    pub fn current_time(&self) -> Duration {
        self.current_time
    }

    /// Whether enough media is buffered to start
    pub fn is_able_to_play(&self) -> bool {
        self.able_to_play
    }

    /// Whether initialisation completed
    pub fn is_initialised(&self) -> bool {
        self.initialised
    }

    /// Base volume (0.0 to 1.0)
    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Volume last written to the backend, including fade progress
    pub fn output_volume(&self) -> f32 {
        self.output_volume
    }

    /// Last requested surface size
    pub fn size(&self) -> Option<PlayerSize> {
        self.size
    }

    /// Whether a fade is running
    pub fn is_fading(&self) -> bool {
        self.fade.is_some()
    }

    /// Restarts issued since the last `play`
    pub fn forced_start_attempts(&self) -> u32 {
        self.forced_start_attempts
    }

    /// Whether an offline error is waiting for connectivity
    pub fn is_awaiting_reconnect(&self) -> bool {
        self.reconnect.is_some()
    }

    /// Bind a track without loading it
    pub fn bind_track(&mut self, track: SharedTrack) {
        self.track = Some(track);
    }

    /// Signal that the hosting view exists
    pub fn notify_view_ready(&mut self) {
        self.view_ready = true;
        self.finish_step(InitStep::WaitForView);
    }

    /// Run the initialisation pipeline
    ///
    /// Repeated calls share the in-flight run; completed steps are not
    /// repeated. A failed run rejects every waiter and must be restarted
    /// by calling this again.
    pub fn initialise(&mut self) -> Completion<()> {
        if self.initialised {
            return Completion::ready(());
        }

        let (resolver, completion) = Completion::pending();
        self.init.waiters.push(resolver);

        if !self.init.started {
            self.init.started = true;
            self.init.steps = INIT_STEPS.into_iter().collect();
            tracing::debug!("{}: initialising {} player", self.id, self.kind);
        }

        self.advance_init();
        completion
    }

    /// Start playback, optionally from a position
    ///
    /// Resolves once the player reports `Playing`. A pause reported before
    /// playback has actually begun is retried a bounded number of times.
    pub fn play(&mut self, from: Option<Duration>) -> StatusWaiter {
        if self.track.is_none() {
            return Completion::failed(PlaybackError::NoTrackBound);
        }

        self.allowed_to_play = true;
        self.force_start = true;
        self.forced_start_attempts = 0;

        if self.status == PlayerStatus::Playing && from.is_none() {
            return Completion::ready(PlayerStatus::Playing);
        }

        if let Some(from) = from {
            self.current_time = from;
        }

        let waiter = self.wait_for(&[PlayerStatus::Playing]);
        self.run_when_ready(PlayerOp::Start { from });
        waiter
    }

    /// Pause playback
    pub fn pause(&mut self) -> StatusWaiter {
        self.allowed_to_play = false;

        if matches!(
            self.status,
            PlayerStatus::Paused | PlayerStatus::Stopped | PlayerStatus::Ended
        ) || !self.initialised
        {
            self.drop_pending_starts();
            return Completion::ready(self.status);
        }

        let waiter = self.wait_for(&[PlayerStatus::Paused, PlayerStatus::Stopped]);
        self.run_when_ready(PlayerOp::Pause);
        waiter
    }

    /// Stop playback
    pub fn stop(&mut self) -> StatusWaiter {
        self.allowed_to_play = false;

        if matches!(self.status, PlayerStatus::Stopped | PlayerStatus::Ended)
            || !self.initialised
        {
            self.drop_pending_starts();
            return Completion::ready(self.status);
        }

        let waiter = self.wait_for(&[PlayerStatus::Stopped, PlayerStatus::Paused]);
        self.run_when_ready(PlayerOp::Stop);
        waiter
    }

    /// Jump to a position; resolves once playing
    pub fn seek_to(&mut self, to: Duration) -> StatusWaiter {
        self.current_time = to;
        let waiter = self.wait_for(&[PlayerStatus::Playing]);
        self.run_when_ready(PlayerOp::Seek(to));
        waiter
    }

    /// Load a track into the backend, optionally positioned at `start`
    pub fn preload(&mut self, start: Option<Duration>) {
        self.run_when_ready(PlayerOp::Preload { start });
    }

    /// Rebind to another track
    ///
    /// Returns `false` without touching the backend if `track` is already
    /// bound. A playing backend is stopped before the new track is loaded.
    pub fn update_track(&mut self, track: SharedTrack) -> bool {
        if self.track_id() == Some(track.id()) {
            return false;
        }

        let was_playing = self.status == PlayerStatus::Playing;
        tracing::debug!(
            "{}: rebinding from {:?} to {}",
            self.id,
            self.track_id().map(TrackId::as_str),
            track.id()
        );

        self.set_status(PlayerStatus::Updating);
        self.track = Some(track);
        self.fade = None;
        self.duration = None;
        self.current_time = Duration::ZERO;
        self.able_to_play = false;
        self.error = None;
        self.reconnect = None;
        self.time_updates.reset();

        if was_playing && self.initialised && !self.awaiting_update_stop {
            self.awaiting_update_stop = true;
            self.after_update.insert(0, PlayerOp::Preload { start: None });
            self.backend.stop();
        } else {
            self.run_when_ready(PlayerOp::Preload { start: None });
        }

        self.request_metadata_if_missing();
        true
    }

    /// Set the base volume (0.0 to 1.0)
    ///
    /// Deferred until initialisation completes. A running fade keeps
    /// working relative to the new value.
    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        if self.fade.is_none() {
            self.write_volume(self.volume);
        }
    }

    /// Resize the player surface; deferred until initialised
    pub fn set_size(&mut self, size: PlayerSize) {
        self.size = Some(size);
        if self.initialised {
            self.backend.set_size(size);
        }
    }

    /// Fade in over `duration`
    ///
    /// Replaces any running fade. Each step writes `volume - sample` with
    /// the sample easing from 1 to 0.
    pub fn fade_in(&mut self, duration: Duration, now: Instant) {
        self.start_fade(Ease::new(1.0, 0.0, duration), now);
    }

    /// Fade out over `duration`
    ///
    /// Each step writes `volume - sample` with the sample easing from 0 to 1.
    pub fn fade_out(&mut self, duration: Duration, now: Instant) {
        self.start_fade(Ease::new(0.0, 1.0, duration), now);
    }

    /// Stop the running fade where it is
    pub fn cancel_fade(&mut self) {
        self.fade = None;
    }

    /// Process backend reports and timers
    pub fn tick(&mut self, now: Instant) -> Vec<PlayerEvent> {
        while let Ok(event) = self.backend_events.try_recv() {
            self.handle_backend_event(event, now);
        }

        if let Some(time) = self.time_updates.flush(now) {
            self.outgoing.push(PlayerEvent::CurrentTimeChanged(time));
        }

        self.check_reconnect();
        self.advance_fade(now);

        std::mem::take(&mut self.outgoing)
    }

    /// Tear the player down
    ///
    /// Pending completions resolve with [`PlaybackError::Detached`]. Safe to
    /// call more than once.
    pub fn de_initialise(&mut self) {
        if self.listeners_bound {
            self.backend.unbind_listeners();
            self.listeners_bound = false;
        }

        if self.initialised {
            self.backend.stop();
        }

        if self.initialised || self.init.started {
            self.backend.deinitialise_player();
            tracing::debug!("{}: de-initialised", self.id);
        }

        self.initialised = false;
        self.init.reset();
        self.init.waiters.clear();
        self.waiters.clear();
        self.deferred.clear();
        self.after_update.clear();
        self.awaiting_update_stop = false;

        self.duration = None;
        self.current_time = Duration::ZERO;
        self.able_to_play = false;
        self.track = None;
        self.allowed_to_play = false;
        self.force_start = false;
        self.reconnect = None;
        self.fade = None;
        self.time_updates.reset();

        while self.backend_events.try_recv().is_ok() {}
        self.status = PlayerStatus::NotInitialised;
        self.outgoing.clear();
    }

    fn advance_init(&mut self) {
        while self.init.in_flight.is_none() {
            let Some(step) = self.init.steps.pop_front() else {
                if self.init.started {
                    self.complete_init();
                }
                return;
            };

            match self.run_step(step) {
                InitProgress::Complete => {
                    if step == InitStep::InitialiseSdk {
                        self.sdk.mark_ready(self.kind);
                    }
                }
                InitProgress::Pending => self.init.in_flight = Some(step),
                InitProgress::Failed(reason) => {
                    self.fail_init(reason);
                    return;
                }
            }
        }
    }

    fn run_step(&mut self, step: InitStep) -> InitProgress {
        match step {
            InitStep::WaitForView if self.view_ready => InitProgress::Complete,
            InitStep::WaitForView => InitProgress::Pending,
            InitStep::InitialiseSdk if self.sdk.is_ready(self.kind) => InitProgress::Complete,
            InitStep::InitialiseSdk => self.backend.initialise_sdk(),
            InitStep::InitialisePlayer => {
                let options = PlayerOptions {
                    size: self.size.unwrap_or_default(),
                };
                self.backend.initialise_player(&options)
            }
        }
    }

    fn finish_step(&mut self, step: InitStep) {
        if self.init.in_flight != Some(step) {
            return;
        }

        self.init.in_flight = None;
        if step == InitStep::InitialiseSdk {
            self.sdk.mark_ready(self.kind);
        }
        self.advance_init();
    }

    fn complete_init(&mut self) {
        self.init.started = false;
        self.initialised = true;

        self.backend.bind_listeners();
        self.listeners_bound = true;

        self.backend.set_volume(self.output_volume);
        if let Some(size) = self.size {
            self.backend.set_size(size);
        }

        for op in std::mem::take(&mut self.deferred) {
            self.run_when_ready(op);
        }

        self.set_status(PlayerStatus::Initialised);
        tracing::debug!("{}: initialised", self.id);

        for waiter in self.init.waiters.drain(..) {
            let _ = waiter.send(Ok(()));
        }

        self.request_metadata_if_missing();
    }

    fn fail_init(&mut self, reason: String) {
        tracing::error!("{}: initialisation failed: {}", self.id, reason);
        self.init.reset();

        for waiter in self.init.waiters.drain(..) {
            let _ = waiter.send(Err(PlaybackError::Initialisation(reason.clone())));
        }
        self.outgoing.push(PlayerEvent::InitialisationFailed(reason));
    }

    fn request_metadata_if_missing(&mut self) {
        if let Some(track) = &self.track {
            if track.needs_metadata() {
                self.outgoing
                    .push(PlayerEvent::MetadataRequested(track.id().clone()));
            }
        }
    }

    fn run_when_ready(&mut self, op: PlayerOp) {
        if !self.initialised {
            self.deferred.push(op);
        } else if self.awaiting_update_stop {
            self.after_update.push(op);
        } else {
            self.execute(op);
        }
    }

    fn execute(&mut self, op: PlayerOp) {
        match op {
            PlayerOp::Preload { start } => {
                let Some(track) = self.track.clone() else {
                    return;
                };
                if let Err(e) = self.backend.preload(&track, start) {
                    self.record_error(e.to_string());
                }
            }
            PlayerOp::Start { from } => {
                if let Some(from) = from {
                    self.backend.seek_to(from);
                }
                self.backend.start();
            }
            PlayerOp::Seek(to) => self.backend.seek_to(to),
            PlayerOp::Pause => self.backend.pause(),
            PlayerOp::Stop => self.backend.stop(),
        }
    }

    fn drop_pending_starts(&mut self) {
        self.deferred
            .retain(|op| !matches!(op, PlayerOp::Start { .. } | PlayerOp::Seek(_)));
        self.after_update
            .retain(|op| !matches!(op, PlayerOp::Start { .. } | PlayerOp::Seek(_)));
    }

    fn handle_backend_event(&mut self, event: BackendEvent, now: Instant) {
        match event {
            BackendEvent::SdkReady => self.finish_step(InitStep::InitialiseSdk),
            BackendEvent::PlayerReady => self.finish_step(InitStep::InitialisePlayer),
            BackendEvent::InitFailed(reason) => {
                if self.init.in_flight.is_some() {
                    self.fail_init(reason);
                }
            }
            _ if !self.listeners_bound => {}
            BackendEvent::DurationKnown(duration) => {
                self.duration = Some(duration);
                self.outgoing.push(PlayerEvent::DurationChanged(duration));
            }
            BackendEvent::CurrentTime(time) => {
                self.current_time = time;
                if let Some(time) = self.time_updates.offer(time, now) {
                    self.outgoing.push(PlayerEvent::CurrentTimeChanged(time));
                }
            }
            BackendEvent::AbleToPlay => self.able_to_play = true,
            BackendEvent::Waiting => self.set_status(PlayerStatus::Waiting),
            BackendEvent::Ready => self.set_status(PlayerStatus::Ready),
            BackendEvent::Playing if !self.allowed_to_play => {
                tracing::debug!("{}: playback started without a request, pausing", self.id);
                self.backend.pause();
            }
            BackendEvent::Playing => {
                self.force_start = false;
                self.error = None;
                self.set_status(PlayerStatus::Playing);
            }
            BackendEvent::Paused => self.on_paused(),
            BackendEvent::Ended => {
                self.allowed_to_play = false;
                if let Some(duration) = self.duration {
                    self.current_time = duration;
                }
                self.set_status(PlayerStatus::Ended);
            }
            BackendEvent::Stopped => {
                if self.awaiting_update_stop {
                    self.awaiting_update_stop = false;
                    for op in std::mem::take(&mut self.after_update) {
                        self.execute(op);
                    }
                } else {
                    self.set_status(PlayerStatus::Stopped);
                }
            }
            BackendEvent::Error(reason) => self.on_error(reason),
        }
    }

    fn on_paused(&mut self) {
        let reached_end = self.duration.is_some_and(|d| self.current_time >= d);

        if self.force_start && self.allowed_to_play && !reached_end {
            if self.forced_start_attempts < self.max_forced_start_attempts {
                self.forced_start_attempts += 1;
                tracing::warn!(
                    "{}: backend paused unexpectedly, restarting (attempt {}/{})",
                    self.id,
                    self.forced_start_attempts,
                    self.max_forced_start_attempts
                );
                self.backend.start();
                return;
            }

            tracing::warn!(
                "{}: backend refused to start after {} attempts, staying paused",
                self.id,
                self.forced_start_attempts
            );
            self.force_start = false;
            self.allowed_to_play = false;
            self.set_status(PlayerStatus::Paused);

            // Pending play requests settle with the final status
            for wait in self.waiters.drain(..) {
                let _ = wait.resolver.send(Ok(PlayerStatus::Paused));
            }
            return;
        }

        self.set_status(PlayerStatus::Paused);
    }

    fn on_error(&mut self, reason: Option<String>) {
        if !self.connectivity.is_online() {
            if self.reconnect.is_none() {
                tracing::warn!("{}: playback interrupted while offline, waiting", self.id);
                self.reconnect = Some(self.connectivity.subscribe());
            }
            self.set_status(PlayerStatus::Waiting);
            return;
        }

        self.record_error(reason.unwrap_or_else(|| "Unknown playback error".to_string()));
    }

    fn record_error(&mut self, message: String) {
        tracing::error!("{}: {}", self.id, message);
        self.error = Some(message.clone());

        let mut kept = Vec::with_capacity(self.waiters.len());
        for wait in self.waiters.drain(..) {
            if wait.wanted.contains(&PlayerStatus::Error) {
                kept.push(wait);
            } else {
                let _ = wait
                    .resolver
                    .send(Err(PlaybackError::Backend(message.clone())));
            }
        }
        self.waiters = kept;

        self.set_status(PlayerStatus::Error);
    }

    fn check_reconnect(&mut self) {
        let online = match self.reconnect.as_mut() {
            Some(receiver) => *receiver.borrow_and_update(),
            None => return,
        };
        if !online {
            return;
        }

        self.reconnect = None;
        tracing::info!(
            "{}: connectivity restored, resuming at {:?}",
            self.id,
            self.current_time
        );

        let position = self.current_time;
        self.run_when_ready(PlayerOp::Preload {
            start: Some(position),
        });
        self.run_when_ready(PlayerOp::Seek(position));
        if self.allowed_to_play {
            self.run_when_ready(PlayerOp::Start { from: None });
        }
    }

    fn start_fade(&mut self, ease: Ease, now: Instant) {
        let mut sampler = ease.sampler();
        if let Some(sample) = sampler.sample(now) {
            self.write_volume(self.volume - sample);
        }
        self.fade = (!sampler.is_finished()).then_some(sampler);
    }

    fn advance_fade(&mut self, now: Instant) {
        let Some(sampler) = self.fade.as_mut() else {
            return;
        };

        match sampler.sample(now) {
            Some(sample) => {
                let finished = sampler.is_finished();
                self.write_volume(self.volume - sample);
                if finished {
                    self.fade = None;
                }
            }
            None => self.fade = None,
        }
    }

    fn write_volume(&mut self, volume: f32) {
        self.output_volume = volume.clamp(0.0, 1.0);
        if self.initialised {
            self.backend.set_volume(self.output_volume);
        }
    }

    fn wait_for(&mut self, wanted: &[PlayerStatus]) -> StatusWaiter {
        if wanted.contains(&self.status) {
            return Completion::ready(self.status);
        }

        self.waiters.retain(|wait| !wait.resolver.is_closed());
        let (resolver, waiter) = Completion::pending();
        self.waiters.push(StatusWait {
            wanted: wanted.to_vec(),
            resolver,
        });
        waiter
    }

    fn set_status(&mut self, status: PlayerStatus) {
        let mut kept = Vec::with_capacity(self.waiters.len());
        for wait in self.waiters.drain(..) {
            if wait.wanted.contains(&status) {
                let _ = wait.resolver.send(Ok(status));
            } else {
                kept.push(wait);
            }
        }
        self.waiters = kept;

        if self.status != status {
            tracing::debug!("{}: {} -> {}", self.id, self.status, status);
            self.status = status;
            self.outgoing.push(PlayerEvent::StatusChanged(status));
        }
    }
}

impl Drop for PlayerInstance {
    fn drop(&mut self) {
        self.de_initialise();
    }
}
