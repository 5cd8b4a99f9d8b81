/// Channel player error types
use segue_core::SegueError;
use segue_playback::PlaybackError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TvError>;

#[derive(Debug, Error)]
pub enum TvError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Playback error: {0}")]
    Playback(#[from] PlaybackError),

    #[error("Track error: {0}")]
    Core(#[from] SegueError),

    #[error("Runtime error: {0}")]
    Runtime(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<config::ConfigError> for TvError {
    fn from(err: config::ConfigError) -> Self {
        TvError::Config(err.to_string())
    }
}
