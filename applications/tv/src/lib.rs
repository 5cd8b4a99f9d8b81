//! Segue TV Library
//!
//! Headless channel player: loads a channel from configuration, drives the
//! Segue player manager against a simulated streaming backend and reports
//! what it does.
//!
//! This library exposes the runner and configuration for testing purposes.

pub mod backend;
pub mod config;
pub mod error;
pub mod runner;

pub use backend::{SimulatedBackend, SimulatedBackendFactory};
pub use config::{ChannelSettings, ChannelTrack, RuntimeSettings, TvConfig};
pub use error::{Result, TvError};
pub use runner::{ChannelRunner, EventOutput, RunSummary};
