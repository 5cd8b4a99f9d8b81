//! Network connectivity signal
//!
//! The host owns a [`Connectivity`] handle and flips it as the network
//! comes and goes. Players waiting to recover from an offline error keep a
//! subscription and resume once it reports online again.

use tokio::sync::watch;

/// Shared online/offline flag
#[derive(Debug, Clone)]
pub struct Connectivity {
    sender: watch::Sender<bool>,
}

impl Connectivity {
    /// Create a connectivity handle with an initial state
    pub fn new(online: bool) -> Self {
        let (sender, _) = watch::channel(online);
        Self { sender }
    }

    /// Current state
    pub fn is_online(&self) -> bool {
        *self.sender.borrow()
    }

    /// Update the state; subscribers see the change on their next check
    pub fn set_online(&self, online: bool) {
        let previous = self.sender.send_replace(online);
        if previous != online {
            tracing::info!("Connectivity changed: {}", if online { "online" } else { "offline" });
        }
    }

    /// Watch for changes
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.sender.subscribe()
    }
}

impl Default for Connectivity {
    fn default() -> Self {
        Self::new(true)
    }
}
