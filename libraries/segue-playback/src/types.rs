//! Core types for playback orchestration

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::error::{PlaybackError, Result};

/// Playback status of a queue item
///
/// `Requested*` variants are requests made by the outside world; the
/// manager answers them by driving a player and then writes the settled
/// status (`Playing`, `Paused`, `Stopped`, `Ended`) back onto the item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QueueItemStatus {
    /// Not playing
    Stopped,

    /// Playback requested, player not confirmed yet
    RequestedPlaying,

    /// Player confirmed playback
    Playing,

    /// Pause requested
    RequestedPause,

    /// Player confirmed pause
    Paused,

    /// Stop requested
    RequestedStop,

    /// Played to the end
    Ended,
}

impl QueueItemStatus {
    /// Whether this is a status callers may request directly
    pub fn is_request(&self) -> bool {
        matches!(
            self,
            QueueItemStatus::RequestedPlaying
                | QueueItemStatus::RequestedPause
                | QueueItemStatus::RequestedStop
        )
    }

    /// Whether the item counts as the one being listened to
    pub fn is_engaged(&self) -> bool {
        matches!(
            self,
            QueueItemStatus::RequestedPlaying
                | QueueItemStatus::Playing
                | QueueItemStatus::RequestedPause
                | QueueItemStatus::Paused
        )
    }
}

/// Lifecycle status of a player instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerStatus {
    /// Fresh or torn down
    NotInitialised,

    /// Backend ready to take commands
    Initialised,

    /// Backend reports the media is loaded
    Ready,

    /// Buffering or waiting for connectivity
    Waiting,

    /// Playing
    Playing,

    /// Paused
    Paused,

    /// Stopped
    Stopped,

    /// Rebinding to another track
    Updating,

    /// Played to the end
    Ended,

    /// Backend reported an error; a new play request recovers
    Error,
}

impl fmt::Display for PlayerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Identifier of a player instance, unique per factory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player-{}", self.0)
    }
}

/// Role a player plays in the active/upcoming pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerRole {
    /// Not yet placed by the manager
    Detached,

    /// The audible player
    Active,

    /// Preloaded for the next queue item, not visible yet
    Upcoming,
}

/// Pixel size of a player surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlayerSize {
    /// Width in pixels
    pub width: u32,

    /// Height in pixels
    pub height: u32,
}

impl PlayerSize {
    /// Create a size
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Configuration for the player manager
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Upper bound of a crossfade in seconds (default: 10)
    pub fade_length_secs: f64,

    /// Remaining time at which the next player is prepared (default: 30)
    pub prepare_window_secs: f64,

    /// Restarts attempted after an unsolicited pause (default: 5)
    pub max_forced_start_attempts: u32,

    /// Minimum spacing of current-time notifications (default: 900)
    pub time_update_interval_ms: u64,

    /// Initial shared player width in pixels (default: 640)
    pub player_width: u32,

    /// Initial volume (0-100, default: 100)
    pub volume: u8,

    /// Wrap around at the end of the queue (default: true)
    pub loop_queue: bool,

    /// Aspect ratio used while a track's own is unknown (default: 16:9)
    pub default_aspect_ratio: f64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            fade_length_secs: 10.0,
            prepare_window_secs: 30.0,
            max_forced_start_attempts: 5,
            time_update_interval_ms: 900,
            player_width: 640,
            volume: 100,
            loop_queue: true,
            default_aspect_ratio: 16.0 / 9.0,
        }
    }
}

impl PlaybackConfig {
    /// Configured crossfade upper bound
    pub fn fade_length(&self) -> Duration {
        Duration::from_secs_f64(self.fade_length_secs.max(0.0))
    }

    /// Configured prepare-ahead window
    pub fn prepare_window(&self) -> Duration {
        Duration::from_secs_f64(self.prepare_window_secs.max(0.0))
    }

    /// Configured time-update throttle interval
    pub fn time_update_interval(&self) -> Duration {
        Duration::from_millis(self.time_update_interval_ms)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !self.fade_length_secs.is_finite() || self.fade_length_secs < 0.0 {
            return Err(PlaybackError::InvalidConfig(format!(
                "fade_length_secs must be a non-negative number, got {}",
                self.fade_length_secs
            )));
        }

        if !self.prepare_window_secs.is_finite() || self.prepare_window_secs < 0.0 {
            return Err(PlaybackError::InvalidConfig(format!(
                "prepare_window_secs must be a non-negative number, got {}",
                self.prepare_window_secs
            )));
        }

        if self.player_width == 0 {
            return Err(PlaybackError::InvalidConfig(
                "player_width must be greater than zero".to_string(),
            ));
        }

        if self.volume > 100 {
            return Err(PlaybackError::InvalidConfig(format!(
                "volume must be between 0 and 100, got {}",
                self.volume
            )));
        }

        if !self.default_aspect_ratio.is_finite() || self.default_aspect_ratio <= 0.0 {
            return Err(PlaybackError::InvalidConfig(format!(
                "default_aspect_ratio must be positive, got {}",
                self.default_aspect_ratio
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = PlaybackConfig::default();
        assert_eq!(config.fade_length(), Duration::from_secs(10));
        assert_eq!(config.prepare_window(), Duration::from_secs(30));
        assert_eq!(config.max_forced_start_attempts, 5);
        assert_eq!(config.time_update_interval(), Duration::from_millis(900));
        assert!(config.loop_queue);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_config_uses_defaults() {
        let config: PlaybackConfig =
            serde_json::from_str(r#"{ "fade_length_secs": 4.5, "loop_queue": false }"#).unwrap();
        assert_eq!(config.fade_length(), Duration::from_millis(4500));
        assert!(!config.loop_queue);
        assert_eq!(config.prepare_window_secs, 30.0);
    }

    #[test]
    fn invalid_config_rejected() {
        let config = PlaybackConfig {
            player_width: 0,
            ..PlaybackConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(PlaybackError::InvalidConfig(_))
        ));

        let config = PlaybackConfig {
            fade_length_secs: f64::NAN,
            ..PlaybackConfig::default()
        };
        assert!(config.validate().is_err());

        let config = PlaybackConfig {
            volume: 101,
            ..PlaybackConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn requested_statuses() {
        assert!(QueueItemStatus::RequestedPlaying.is_request());
        assert!(QueueItemStatus::RequestedStop.is_request());
        assert!(!QueueItemStatus::Playing.is_request());
        assert!(QueueItemStatus::Paused.is_engaged());
        assert!(!QueueItemStatus::Ended.is_engaged());
    }
}
