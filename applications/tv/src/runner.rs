//! Channel runner
//!
//! Owns the player manager and drives it from a tokio interval. Manager
//! events are logged or printed as JSON lines; metadata requests are served
//! from the channel catalog on background tasks.

use crate::backend::SimulatedBackendFactory;
use crate::config::TvConfig;
use crate::error::{Result, TvError};
use segue_core::{
    MemoryTrackProvider, ProviderKind, SegueError, SharedTrack, TrackId, TrackProvider,
};
use segue_playback::{Connectivity, ManagerEvent, PlayerManager};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{error, info, warn};

type FetchResult = (TrackId, std::result::Result<(), SegueError>);

/// How manager events are reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventOutput {
    /// Through the tracing subscriber
    #[default]
    Log,
    /// One JSON object per line on stdout
    Json,
}

impl EventOutput {
    fn emit(self, event: &ManagerEvent) -> Result<()> {
        match self {
            EventOutput::Json => println!("{}", serde_json::to_string(event)?),
            EventOutput::Log => match event {
                ManagerEvent::SelectedTrackChanged { track: Some(track) } => {
                    info!("Now showing {}", track);
                }
                ManagerEvent::SelectedTrackChanged { track: None } => info!("Nothing selected"),
                ManagerEvent::CrossfadeStarted {
                    from,
                    to,
                    duration_ms,
                } => info!("Crossfading {} -> {} over {}ms", from, to, duration_ms),
                ManagerEvent::NextPlayerPrepared { player, track } => {
                    info!("Prepared {} on {}", track, player);
                }
                ManagerEvent::Error { message } => error!("Playback error: {}", message),
                other => tracing::debug!("{:?}", other),
            },
        }
        Ok(())
    }
}

/// Counters collected over a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub ticks: u64,
    pub events: usize,
    pub crossfades: usize,
    pub metadata_fetched: usize,
}

/// Plays a configured channel until shut down
pub struct ChannelRunner {
    manager: PlayerManager,
    tick_interval: Duration,
    run_for: Option<Duration>,
    providers: HashMap<ProviderKind, Arc<dyn TrackProvider>>,
    tracks: HashMap<TrackId, SharedTrack>,
    output: EventOutput,
    fetch_tx: mpsc::UnboundedSender<FetchResult>,
    fetch_rx: mpsc::UnboundedReceiver<FetchResult>,
    summary: RunSummary,
}

impl ChannelRunner {
    /// Build the manager and queue the channel
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(config: TvConfig, output: EventOutput) -> Result<Self> {
        config.validate()?;

        let runtime = Handle::try_current().map_err(|e| TvError::Runtime(e.to_string()))?;
        let backends = SimulatedBackendFactory::new(
            runtime,
            config.runtime.time_update_step(),
            config.runtime.fallback_duration(),
        );
        let mut manager = PlayerManager::new(
            config.playback.clone(),
            Box::new(backends),
            Connectivity::default(),
        )?;

        let mut catalogs: HashMap<ProviderKind, MemoryTrackProvider> = HashMap::new();
        let mut tracks = HashMap::new();
        for entry in &config.channel.tracks {
            catalogs
                .entry(entry.provider)
                .or_insert_with(|| MemoryTrackProvider::new(entry.provider))
                .insert(entry.id.as_str(), entry.metadata());

            let track = entry.to_track(config.channel.lazy_metadata);
            tracks.insert(track.id().clone(), SharedTrack::clone(&track));
            manager.add(track, None)?;
        }

        if let Some(width) = config.runtime.display_width {
            manager.enter_fullscreen(width);
        }
        if let Some(first) = config.channel.tracks.first() {
            manager.play(&TrackId::new(first.id.as_str()))?;
        }

        info!(
            "Channel {} loaded with {} tracks",
            config.channel.name.as_deref().unwrap_or("(unnamed)"),
            tracks.len()
        );

        let providers = catalogs
            .into_iter()
            .map(|(kind, catalog)| (kind, Arc::new(catalog) as Arc<dyn TrackProvider>))
            .collect();
        let (fetch_tx, fetch_rx) = mpsc::unbounded_channel();

        Ok(Self {
            manager,
            tick_interval: config.runtime.tick_interval(),
            run_for: config.runtime.run_for(),
            providers,
            tracks,
            output,
            fetch_tx,
            fetch_rx,
            summary: RunSummary::default(),
        })
    }

    pub fn manager(&self) -> &PlayerManager {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut PlayerManager {
        &mut self.manager
    }

    pub fn summary(&self) -> RunSummary {
        self.summary
    }

    /// Drive the manager until `shutdown` resolves or the run time elapses
    pub async fn run<F>(&mut self, shutdown: F) -> Result<RunSummary>
    where
        F: Future<Output = ()>,
    {
        let mut interval = tokio::time::interval(self.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let deadline = self.run_for.map(|run_for| Instant::now() + run_for);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                () = &mut shutdown => {
                    info!("Shutdown requested");
                    break;
                }
                () = expired(deadline) => {
                    info!("Run time elapsed");
                    break;
                }
                Some((id, result)) = self.fetch_rx.recv() => self.on_fetched(&id, result),
                now = interval.tick() => self.step(now)?,
            }
        }

        Ok(self.summary)
    }

    fn step(&mut self, now: Instant) -> Result<()> {
        self.manager.tick(now.into_std());
        self.summary.ticks += 1;

        for event in self.manager.drain_events() {
            self.summary.events += 1;
            match &event {
                ManagerEvent::MetadataRequested { track } => self.fetch_metadata(track),
                ManagerEvent::CrossfadeStarted { .. } => self.summary.crossfades += 1,
                _ => {}
            }
            self.output.emit(&event)?;
        }
        Ok(())
    }

    fn fetch_metadata(&self, id: &TrackId) {
        let Some(track) = self.tracks.get(id).cloned() else {
            warn!("Metadata requested for unknown track {}", id);
            return;
        };
        let Some(provider) = self.providers.get(&track.provider()).cloned() else {
            warn!("No metadata provider for {}", track.provider());
            return;
        };

        let tx = self.fetch_tx.clone();
        let id = id.clone();
        tokio::spawn(async move {
            let result = track.fetch(provider.as_ref()).await;
            let _ = tx.send((id, result));
        });
    }

    fn on_fetched(&mut self, id: &TrackId, result: std::result::Result<(), SegueError>) {
        match result {
            Ok(()) => {
                self.summary.metadata_fetched += 1;
                if let Some(title) = self.tracks.get(id).and_then(|t| t.title()) {
                    info!("Metadata for {}: {}", id, title);
                }
                self.manager.refresh_geometry();
            }
            Err(e) => warn!("Metadata lookup for {} failed: {}", id, e),
        }
    }
}

async fn expired(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
