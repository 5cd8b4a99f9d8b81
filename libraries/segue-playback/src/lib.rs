//! Segue - Crossfading Playback Orchestration
//!
//! Plays an ordered queue of remotely streamed tracks back to back,
//! crossfading from one to the next so there is never a silent gap.
//!
//! This crate provides:
//! - A play queue with status-derived navigation and looping
//! - A player lifecycle state machine around provider backends
//! - A player factory with geometry and reuse decisions
//! - A player manager keeping at most two live players (active + upcoming)
//! - Prepare-ahead and time-windowed crossfades
//! - Bounded forced-start retry and offline recovery
//!
//! # Architecture
//!
//! Everything runs on one logical control flow. Backends never call back
//! into the engine; they post [`BackendEvent`]s on a channel and the host
//! drives [`PlayerManager::tick`] at a fixed cadence:
//!
//! ```text
//! PlayQueue --status requests--> PlayerManager --commands--> PlayerInstance --> PlayerBackend
//!     ^                               |    ^                        |                 |
//!     +-------settled statuses--------+    +-----PlayerEvents-------+<--BackendEvents--+
//! ```
//!
//! Platform code (embedded SDKs, decoders) implements [`PlayerBackend`] and
//! [`BackendFactory`].
//!
//! # Example
//!
//! ```rust,no_run
//! use segue_core::{ProviderKind, Track};
//! use segue_playback::{BackendFactory, Connectivity, PlaybackConfig, PlayerManager};
//! use std::time::Instant;
//!
//! # fn run(backends: Box<dyn BackendFactory>) -> segue_playback::Result<()> {
//! let mut manager = PlayerManager::new(PlaybackConfig::default(), backends, Connectivity::default())?;
//!
//! manager.add(Track::new("harbour-cam", ProviderKind::Youtube).shared(), None)?;
//! manager.add_and_play(Track::new("market-cam", ProviderKind::Youtube).shared())?;
//!
//! loop {
//!     manager.tick(Instant::now());
//!     for event in manager.drain_events() {
//!         println!("{event:?}");
//!     }
//!     # break;
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod backend;
pub mod completion;
pub mod connectivity;
pub mod ease;
pub mod error;
pub mod events;
pub mod factory;
pub mod instance;
pub mod manager;
pub mod queue;
pub mod throttle;
pub mod types;
pub mod volume;

pub use backend::{
    BackendEvent, BackendEventSink, BackendFactory, InitProgress, PlayerBackend, PlayerOptions,
    SdkRegistry,
};
pub use completion::{Completion, StatusWaiter};
pub use connectivity::Connectivity;
pub use ease::{Ease, EaseCurve, EaseSampler};
pub use error::{PlaybackError, Result};
pub use events::{ManagerEvent, PlayerEvent};
pub use factory::{player_size, PlayerFactory};
pub use instance::{InitStep, PlayerInstance};
pub use manager::PlayerManager;
pub use queue::{PlayQueue, QueueEvent, QueueItem};
pub use throttle::Throttle;
pub use types::{PlaybackConfig, PlayerId, PlayerRole, PlayerSize, PlayerStatus, QueueItemStatus};
pub use volume::Volume;
