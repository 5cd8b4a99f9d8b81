/// Core error types for Segue
use crate::types::TrackId;
use thiserror::Error;

/// Result type alias using `SegueError`
pub type Result<T> = std::result::Result<T, SegueError>;

/// Core error type for Segue
#[derive(Error, Debug)]
pub enum SegueError {
    /// Track not known to the provider
    #[error("Track not found: {0}")]
    TrackNotFound(TrackId),

    /// Provider rejected or failed a lookup
    #[error("Provider error: {0}")]
    Provider(String),

    /// Network error
    #[error("Network error: {0}")]
    Network(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl SegueError {
    /// Create a provider error
    pub fn provider(msg: impl Into<String>) -> Self {
        Self::Provider(msg.into())
    }

    /// Create a network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}
