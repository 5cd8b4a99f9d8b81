//! Simulated streaming backend
//!
//! Stands in for an embedded provider player: it accepts every provider,
//! initialises instantly and, while playing, advances a virtual position on
//! a tokio task, reporting it through the backend event channel until the
//! media ends.

use segue_core::{ProviderKind, Track, TrackId};
use segue_playback::{
    BackendEvent, BackendEventSink, BackendFactory, InitProgress, PlayerBackend, PlayerOptions,
    PlayerSize, Result,
};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::debug;

#[derive(Debug, Default)]
struct Media {
    track: Option<TrackId>,
    position: Duration,
    duration: Duration,
}

/// Backend playing virtual media on a timer
pub struct SimulatedBackend {
    kind: ProviderKind,
    runtime: Handle,
    step: Duration,
    fallback_duration: Duration,
    sink: Option<BackendEventSink>,
    media: Arc<Mutex<Media>>,
    ticker: Option<JoinHandle<()>>,
    listening: bool,
    volume: f32,
    size: Option<PlayerSize>,
}

impl SimulatedBackend {
    pub fn new(
        kind: ProviderKind,
        runtime: Handle,
        step: Duration,
        fallback_duration: Duration,
    ) -> Self {
        Self {
            kind,
            runtime,
            step,
            fallback_duration,
            sink: None,
            media: Arc::new(Mutex::new(Media::default())),
            ticker: None,
            listening: false,
            volume: 1.0,
            size: None,
        }
    }

    fn send(&self, event: BackendEvent) {
        if let Some(sink) = &self.sink {
            let _ = sink.send(event);
        }
    }

    fn media(&self) -> std::sync::MutexGuard<'_, Media> {
        self.media.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn halt(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }

    fn is_running(&self) -> bool {
        self.ticker.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl PlayerBackend for SimulatedBackend {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn attach(&mut self, sink: BackendEventSink) {
        self.sink = Some(sink);
    }

    fn initialise_sdk(&mut self) -> InitProgress {
        debug!("Simulated {} SDK loaded", self.kind);
        InitProgress::Complete
    }

    fn initialise_player(&mut self, options: &PlayerOptions) -> InitProgress {
        self.size = Some(options.size);
        InitProgress::Complete
    }

    fn deinitialise_player(&mut self) {
        self.halt();
        *self.media() = Media::default();
    }

    fn bind_listeners(&mut self) {
        self.listening = true;
    }

    fn unbind_listeners(&mut self) {
        self.listening = false;
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
    }

    fn set_size(&mut self, size: PlayerSize) {
        if self.size != Some(size) {
            debug!("Simulated player resized to {}x{}", size.width, size.height);
            self.size = Some(size);
        }
    }

    fn start(&mut self) {
        if self.is_running() {
            self.send(BackendEvent::Playing);
            return;
        }
        let Some(sink) = self.sink.clone() else {
            return;
        };

        let media = Arc::clone(&self.media);
        let step = self.step;
        let _ = sink.send(BackendEvent::Playing);

        self.ticker = Some(self.runtime.spawn(async move {
            let mut interval = tokio::time::interval(step);
            interval.tick().await;

            loop {
                interval.tick().await;
                let (position, ended) = {
                    let mut media = media.lock().unwrap_or_else(PoisonError::into_inner);
                    media.position = (media.position + step).min(media.duration);
                    (media.position, media.position >= media.duration)
                };

                if sink.send(BackendEvent::CurrentTime(position)).is_err() {
                    break;
                }
                if ended {
                    let _ = sink.send(BackendEvent::Ended);
                    break;
                }
            }
        }));
    }

    fn pause(&mut self) {
        self.halt();
        self.send(BackendEvent::Paused);
    }

    fn stop(&mut self) {
        self.halt();
        self.media().position = Duration::ZERO;
        self.send(BackendEvent::Stopped);
    }

    fn seek_to(&mut self, position: Duration) {
        let position = {
            let mut media = self.media();
            media.position = position.min(media.duration);
            media.position
        };
        self.send(BackendEvent::CurrentTime(position));
    }

    fn preload(&mut self, track: &Track, start: Option<Duration>) -> Result<()> {
        self.halt();
        let duration = track.duration().unwrap_or(self.fallback_duration);
        {
            let mut media = self.media();
            media.track = Some(track.id().clone());
            media.duration = duration;
            media.position = start.unwrap_or_default().min(duration);
        }
        debug!("Simulated {} player loaded {}", self.kind, track.id());

        self.send(BackendEvent::DurationKnown(duration));
        self.send(BackendEvent::AbleToPlay);
        self.send(BackendEvent::Ready);
        Ok(())
    }
}

impl Drop for SimulatedBackend {
    fn drop(&mut self) {
        self.halt();
    }
}

/// Factory handing out `SimulatedBackend`s for every provider
pub struct SimulatedBackendFactory {
    runtime: Handle,
    step: Duration,
    fallback_duration: Duration,
}

impl SimulatedBackendFactory {
    pub fn new(runtime: Handle, step: Duration, fallback_duration: Duration) -> Self {
        Self {
            runtime,
            step,
            fallback_duration,
        }
    }
}

impl BackendFactory for SimulatedBackendFactory {
    fn supports(&self, _kind: ProviderKind) -> bool {
        true
    }

    fn create(&mut self, kind: ProviderKind) -> Result<Box<dyn PlayerBackend>> {
        Ok(Box::new(SimulatedBackend::new(
            kind,
            self.runtime.clone(),
            self.step,
            self.fallback_duration,
        )))
    }
}
