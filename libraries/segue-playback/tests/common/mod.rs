//! Shared test helpers: a scripted backend and clock helpers

#![allow(dead_code)]

use segue_core::{ProviderKind, SharedTrack, Track, TrackId, TrackMetadata};
use segue_playback::{
    BackendEvent, BackendEventSink, BackendFactory, InitProgress, PlaybackConfig, PlaybackError,
    PlayerBackend, PlayerOptions, PlayerSize, Result,
};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Media duration reported for tracks without one
pub const DEFAULT_MEDIA_DURATION: Duration = Duration::from_secs(60);

// ===== Recorded calls =====

/// A backend command as seen by the mock
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    InitSdk,
    InitPlayer,
    Deinit,
    Bind,
    Unbind,
    Volume(f32),
    Size(PlayerSize),
    Start,
    Pause,
    Stop,
    Seek(Duration),
    Preload(TrackId, Option<Duration>),
}

// ===== Mock backend =====

#[derive(Debug)]
struct MockState {
    kind: ProviderKind,
    calls: Vec<Call>,
    sink: Option<BackendEventSink>,
    auto_respond: bool,
    sdk_pending: bool,
    player_pending: bool,
    init_failure: Option<String>,
    refuse_start: bool,
    start_error: Option<String>,
    track: Option<TrackId>,
    position: Duration,
    volume: f32,
}

/// Test-side view of a mock backend
#[derive(Debug, Clone)]
pub struct MockHandle {
    state: Arc<Mutex<MockState>>,
}

impl MockHandle {
    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    /// Inject a backend event
    pub fn emit(&self, event: BackendEvent) {
        if let Some(sink) = &self.lock().sink {
            let _ = sink.send(event);
        }
    }

    /// Every command received so far
    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    /// Number of received commands matching `pred`
    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.lock().calls.iter().filter(|c| pred(c)).count()
    }

    /// Forget recorded commands
    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Answer commands with the matching events
    pub fn set_auto_respond(&self, on: bool) {
        self.lock().auto_respond = on;
    }

    /// Leave SDK initialisation pending until `SdkReady`
    pub fn set_sdk_pending(&self, on: bool) {
        self.lock().sdk_pending = on;
    }

    /// Leave player initialisation pending until `PlayerReady`
    pub fn set_player_pending(&self, on: bool) {
        self.lock().player_pending = on;
    }

    /// Fail player initialisation
    pub fn set_init_failure(&self, reason: Option<&str>) {
        self.lock().init_failure = reason.map(str::to_string);
    }

    /// Answer `start` with `Paused` (autoplay blocked)
    pub fn set_refuse_start(&self, on: bool) {
        self.lock().refuse_start = on;
    }

    /// Answer `start` with an error
    pub fn set_start_error(&self, reason: Option<&str>) {
        self.lock().start_error = reason.map(str::to_string);
    }

    /// Track last preloaded
    pub fn track(&self) -> Option<TrackId> {
        self.lock().track.clone()
    }

    /// Playback position as the backend sees it
    pub fn position(&self) -> Duration {
        self.lock().position
    }

    /// Last volume written
    pub fn volume(&self) -> f32 {
        self.lock().volume
    }

    /// Report a playback position
    pub fn report_time(&self, position: Duration) {
        self.lock().position = position;
        self.emit(BackendEvent::CurrentTime(position));
    }
}

/// Scripted backend recording every command
pub struct MockBackend {
    handle: MockHandle,
}

impl MockBackend {
    pub fn new(kind: ProviderKind) -> (Self, MockHandle) {
        let handle = MockHandle {
            state: Arc::new(Mutex::new(MockState {
                kind,
                calls: Vec::new(),
                sink: None,
                auto_respond: true,
                sdk_pending: false,
                player_pending: false,
                init_failure: None,
                refuse_start: false,
                start_error: None,
                track: None,
                position: Duration::ZERO,
                volume: 1.0,
            })),
        };
        (
            Self {
                handle: handle.clone(),
            },
            handle,
        )
    }

    fn record(&self, call: Call) -> MutexGuard<'_, MockState> {
        let mut state = self.handle.lock();
        state.calls.push(call);
        state
    }
}

fn send(state: &MockState, event: BackendEvent) {
    if let Some(sink) = &state.sink {
        let _ = sink.send(event);
    }
}

impl PlayerBackend for MockBackend {
    fn kind(&self) -> ProviderKind {
        self.handle.lock().kind
    }

    fn attach(&mut self, sink: BackendEventSink) {
        self.handle.lock().sink = Some(sink);
    }

    fn initialise_sdk(&mut self) -> InitProgress {
        let state = self.record(Call::InitSdk);
        if state.sdk_pending {
            InitProgress::Pending
        } else {
            InitProgress::Complete
        }
    }

    fn initialise_player(&mut self, _options: &PlayerOptions) -> InitProgress {
        let state = self.record(Call::InitPlayer);
        if let Some(reason) = &state.init_failure {
            InitProgress::Failed(reason.clone())
        } else if state.player_pending {
            InitProgress::Pending
        } else {
            InitProgress::Complete
        }
    }

    fn deinitialise_player(&mut self) {
        self.record(Call::Deinit);
    }

    fn bind_listeners(&mut self) {
        self.record(Call::Bind);
    }

    fn unbind_listeners(&mut self) {
        self.record(Call::Unbind);
    }

    fn set_volume(&mut self, volume: f32) {
        let mut state = self.record(Call::Volume(volume));
        state.volume = volume;
    }

    fn set_size(&mut self, size: PlayerSize) {
        self.record(Call::Size(size));
    }

    fn start(&mut self) {
        let state = self.record(Call::Start);
        if !state.auto_respond {
            return;
        }
        if let Some(reason) = &state.start_error {
            send(&state, BackendEvent::Error(Some(reason.clone())));
        } else if state.refuse_start {
            send(&state, BackendEvent::Paused);
        } else {
            send(&state, BackendEvent::Playing);
        }
    }

    fn pause(&mut self) {
        let state = self.record(Call::Pause);
        if state.auto_respond {
            send(&state, BackendEvent::Paused);
        }
    }

    fn stop(&mut self) {
        let mut state = self.record(Call::Stop);
        state.position = Duration::ZERO;
        if state.auto_respond {
            send(&state, BackendEvent::Stopped);
        }
    }

    fn seek_to(&mut self, position: Duration) {
        let mut state = self.record(Call::Seek(position));
        state.position = position;
        if state.auto_respond {
            send(&state, BackendEvent::CurrentTime(position));
        }
    }

    fn preload(&mut self, track: &Track, start: Option<Duration>) -> Result<()> {
        let mut state = self.record(Call::Preload(track.id().clone(), start));
        state.track = Some(track.id().clone());
        state.position = start.unwrap_or_default();
        if state.auto_respond {
            let duration = track.duration().unwrap_or(DEFAULT_MEDIA_DURATION);
            send(&state, BackendEvent::DurationKnown(duration));
            send(&state, BackendEvent::AbleToPlay);
            send(&state, BackendEvent::Ready);
        }
        Ok(())
    }
}

// ===== Mock factory =====

/// Handles of every backend a `MockFactory` created
#[derive(Debug, Clone, Default)]
pub struct MockRegistry {
    handles: Arc<Mutex<Vec<MockHandle>>>,
    failing_creates: Arc<Mutex<usize>>,
}

impl MockRegistry {
    /// Make the next `count` backend creations fail
    pub fn fail_next_creates(&self, count: usize) {
        *self.failing_creates.lock().unwrap() = count;
    }

    /// Number of backends created
    pub fn created(&self) -> usize {
        self.handles.lock().unwrap().len()
    }

    /// Backend created `index`-th
    pub fn nth(&self, index: usize) -> MockHandle {
        self.handles.lock().unwrap()[index].clone()
    }

    /// Most recent backend that preloaded `id`
    pub fn handle_for(&self, id: &str) -> Option<MockHandle> {
        self.handles
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|h| h.track().as_ref().map(TrackId::as_str) == Some(id))
            .cloned()
    }

    /// Commands received by all backends matching `pred`
    pub fn count(&self, pred: impl Fn(&Call) -> bool + Copy) -> usize {
        self.handles
            .lock()
            .unwrap()
            .iter()
            .map(|h| h.count(pred))
            .sum()
    }
}

/// Backend factory creating `MockBackend`s
pub struct MockFactory {
    kinds: Vec<ProviderKind>,
    registry: MockRegistry,
}

impl MockFactory {
    pub fn new(kinds: &[ProviderKind]) -> (Self, MockRegistry) {
        let registry = MockRegistry::default();
        (
            Self {
                kinds: kinds.to_vec(),
                registry: registry.clone(),
            },
            registry,
        )
    }
}

impl BackendFactory for MockFactory {
    fn supports(&self, kind: ProviderKind) -> bool {
        self.kinds.contains(&kind)
    }

    fn create(&mut self, kind: ProviderKind) -> Result<Box<dyn PlayerBackend>> {
        {
            let mut failing = self.registry.failing_creates.lock().unwrap();
            if *failing > 0 {
                *failing -= 1;
                return Err(PlaybackError::Backend("backend unavailable".to_string()));
            }
        }

        let (backend, handle) = MockBackend::new(kind);
        self.registry.handles.lock().unwrap().push(handle);
        Ok(Box::new(backend))
    }
}

// ===== Fixtures =====

/// Titled track with a known duration
pub fn track(id: &str, secs: u64) -> SharedTrack {
    track_of(id, ProviderKind::Youtube, secs)
}

/// Titled track of a given provider
pub fn track_of(id: &str, kind: ProviderKind, secs: u64) -> SharedTrack {
    Track::with_metadata(
        id,
        kind,
        TrackMetadata {
            title: Some(format!("Camera {id}")),
            duration: Some(Duration::from_secs(secs)),
            aspect_ratio: Some(16.0 / 9.0),
            location: None,
        },
    )
    .shared()
}

/// Default configuration
pub fn config() -> PlaybackConfig {
    PlaybackConfig::default()
}

/// Manually advanced clock
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    now: Instant,
}

impl Clock {
    pub fn new() -> Self {
        Self {
            now: Instant::now(),
        }
    }

    pub fn now(&self) -> Instant {
        self.now
    }

    /// Move forward and return the new instant
    pub fn advance(&mut self, by: Duration) -> Instant {
        self.now += by;
        self.now
    }
}
