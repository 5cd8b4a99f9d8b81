/// Channel player configuration
use crate::error::{Result, TvError};
use segue_core::{GeoLocation, ProviderKind, SharedTrack, Track, TrackId, TrackMetadata};
use segue_playback::PlaybackConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config file picked up from the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "segue.toml";

/// Prefix of environment overrides (`SEGUE__PLAYBACK__VOLUME=40`)
pub const ENV_PREFIX: &str = "SEGUE";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TvConfig {
    #[serde(default)]
    pub playback: PlaybackConfig,

    #[serde(default)]
    pub runtime: RuntimeSettings,

    #[serde(default)]
    pub channel: ChannelSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RuntimeSettings {
    /// Cadence at which the manager is ticked
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Start in fullscreen at this display width
    #[serde(default)]
    pub display_width: Option<u32>,

    /// Stop after this many seconds; run until interrupted when unset
    #[serde(default)]
    pub run_for_secs: Option<u64>,

    /// Media length assumed by the simulated backend for tracks without one
    #[serde(default = "default_fallback_duration_secs")]
    pub fallback_duration_secs: u64,

    /// Spacing of position reports from the simulated backend
    #[serde(default = "default_time_update_step_ms")]
    pub time_update_step_ms: u64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ChannelSettings {
    /// Channel name used in logs
    #[serde(default)]
    pub name: Option<String>,

    /// Queue tracks by id only and fetch their metadata when first bound
    #[serde(default)]
    pub lazy_metadata: bool,

    #[serde(default)]
    pub tracks: Vec<ChannelTrack>,
}

/// A channel entry
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ChannelTrack {
    pub id: String,

    #[serde(default = "default_provider")]
    pub provider: ProviderKind,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub duration_secs: Option<f64>,

    #[serde(default)]
    pub aspect_ratio: Option<f64>,

    #[serde(default)]
    pub location: Option<GeoLocation>,
}

impl ChannelTrack {
    /// Metadata as declared in the channel
    pub fn metadata(&self) -> TrackMetadata {
        TrackMetadata {
            title: self.title.clone(),
            duration: self
                .duration_secs
                .and_then(|secs| Duration::try_from_secs_f64(secs).ok()),
            aspect_ratio: self.aspect_ratio,
            location: self.location.clone(),
        }
    }

    /// Queue track for this entry
    ///
    /// With `lazy` set the track carries its id and provider only.
    pub fn to_track(&self, lazy: bool) -> SharedTrack {
        if lazy {
            Track::new(self.id.as_str(), self.provider).shared()
        } else {
            Track::with_metadata(self.id.as_str(), self.provider, self.metadata()).shared()
        }
    }
}

impl RuntimeSettings {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn run_for(&self) -> Option<Duration> {
        self.run_for_secs.map(Duration::from_secs)
    }

    pub fn fallback_duration(&self) -> Duration {
        Duration::from_secs(self.fallback_duration_secs)
    }

    pub fn time_update_step(&self) -> Duration {
        Duration::from_millis(self.time_update_step_ms)
    }
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            display_width: None,
            run_for_secs: None,
            fallback_duration_secs: default_fallback_duration_secs(),
            time_update_step_ms: default_time_update_step_ms(),
        }
    }
}

impl TvConfig {
    /// Load configuration from file and environment
    ///
    /// An explicit `path` must exist; otherwise `segue.toml` in the working
    /// directory is used when present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                if !path.exists() {
                    return Err(TvError::Config(format!(
                        "config file not found: {}",
                        path.display()
                    )));
                }
                settings = settings.add_source(config::File::from(path.to_path_buf()));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        // Override with environment variables (SEGUE__SECTION__KEY)
        settings = settings.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

        let config: TvConfig = settings.build()?.try_deserialize()?;
        tracing::debug!("Loaded configuration: {:?}", config);
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.playback
            .validate()
            .map_err(|e| TvError::Config(e.to_string()))?;

        if self.runtime.tick_interval_ms == 0 {
            return Err(TvError::Config(
                "runtime.tick_interval_ms must be positive".to_string(),
            ));
        }
        if self.runtime.time_update_step_ms == 0 {
            return Err(TvError::Config(
                "runtime.time_update_step_ms must be positive".to_string(),
            ));
        }
        if self.runtime.fallback_duration_secs == 0 {
            return Err(TvError::Config(
                "runtime.fallback_duration_secs must be positive".to_string(),
            ));
        }
        if self.runtime.display_width == Some(0) {
            return Err(TvError::Config(
                "runtime.display_width must be positive".to_string(),
            ));
        }

        if self.channel.tracks.is_empty() {
            return Err(TvError::Config("channel has no tracks".to_string()));
        }

        let mut seen = HashSet::new();
        for track in &self.channel.tracks {
            if track.id.trim().is_empty() {
                return Err(TvError::Config("channel track with empty id".to_string()));
            }
            if !seen.insert(TrackId::new(track.id.as_str())) {
                return Err(TvError::Config(format!(
                    "duplicate channel track: {}",
                    track.id
                )));
            }
            if let Some(secs) = track.duration_secs {
                if !secs.is_finite() || secs <= 0.0 {
                    return Err(TvError::Config(format!(
                        "track {} has an invalid duration: {}",
                        track.id, secs
                    )));
                }
            }
            if let Some(ratio) = track.aspect_ratio {
                if !ratio.is_finite() || ratio <= 0.0 {
                    return Err(TvError::Config(format!(
                        "track {} has an invalid aspect ratio: {}",
                        track.id, ratio
                    )));
                }
            }
        }

        Ok(())
    }
}

// Default values
fn default_tick_interval_ms() -> u64 {
    100
}

fn default_fallback_duration_secs() -> u64 {
    120
}

fn default_time_update_step_ms() -> u64 {
    250
}

fn default_provider() -> ProviderKind {
    ProviderKind::Youtube
}
