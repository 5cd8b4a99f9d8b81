//! Segue Core
//!
//! Provider-agnostic track types, the track provider contract and error
//! handling shared by the Segue crates.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `Track`, `TrackMetadata`, `GeoLocation`, `ProviderKind`
//! - **Core Traits**: `TrackProvider` (asynchronous metadata lookup)
//! - **Error Handling**: Unified `SegueError` and `Result` types
//!
//! Tracks are shared, never copied: a queue holds `SharedTrack` handles and
//! metadata may be filled in later through a provider while the identity
//! stays fixed.
//!
//! # Example
//!
//! ```rust
//! use segue_core::types::{ProviderKind, Track, TrackMetadata};
//! use std::time::Duration;
//!
//! let track = Track::new("dQw4w9WgXcQ", ProviderKind::Youtube);
//! assert!(track.needs_metadata());
//!
//! track.apply_metadata(TrackMetadata {
//!     title: Some("Harbour cam".to_string()),
//!     duration: Some(Duration::from_secs(240)),
//!     ..TrackMetadata::default()
//! });
//! assert_eq!(track.title().as_deref(), Some("Harbour cam"));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod provider;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use error::{Result, SegueError};
pub use provider::MemoryTrackProvider;
pub use traits::TrackProvider;
pub use types::{GeoLocation, ProviderKind, SharedTrack, Track, TrackId, TrackMetadata};
