//! Leading/trailing edge throttle for noisy notifications

use std::time::{Duration, Instant};

/// Rate limiter that keeps the latest value
///
/// The first value after a quiet period passes straight through. Values
/// offered inside the interval replace each other; the last one is handed
/// out by [`Throttle::flush`] once the interval has elapsed.
#[derive(Debug, Clone)]
pub struct Throttle<T> {
    interval: Duration,
    last_emit: Option<Instant>,
    pending: Option<T>,
}

impl<T> Throttle<T> {
    /// Create a throttle with the given minimum spacing
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_emit: None,
            pending: None,
        }
    }

    /// Offer a value; returns it if it may be emitted now
    pub fn offer(&mut self, value: T, now: Instant) -> Option<T> {
        if self.is_open(now) {
            self.last_emit = Some(now);
            self.pending = None;
            Some(value)
        } else {
            self.pending = Some(value);
            None
        }
    }

    /// Emit the held-back value once the interval has passed
    pub fn flush(&mut self, now: Instant) -> Option<T> {
        if self.pending.is_some() && self.is_open(now) {
            self.last_emit = Some(now);
            self.pending.take()
        } else {
            None
        }
    }

    /// Forget any held value and timing
    pub fn reset(&mut self) {
        self.last_emit = None;
        self.pending = None;
    }

    /// Whether a value is being held back
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    fn is_open(&self, now: Instant) -> bool {
        self.last_emit
            .map_or(true, |last| now.saturating_duration_since(last) >= self.interval)
    }
}
