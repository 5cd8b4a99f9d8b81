//! Easing curves for volume fades
//!
//! An [`Ease`] describes a transition from one value to another over a
//! duration. An [`EaseSampler`] walks that transition against wall-clock
//! time: it starts on the first sample, yields interpolated values while
//! the duration runs, yields the end value exactly once and then stops.
//! A sampler is not restartable; a fresh fade builds a fresh sampler.

use std::f32::consts::PI;
use std::time::{Duration, Instant};

/// Easing curve type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EaseCurve {
    /// Linear interpolation
    Linear,

    /// Circular ease-in: slow start, steep finish
    ///
    /// `1 - sqrt(1 - t^2)`. Used for crossfades so the outgoing player
    /// stays audible for most of the fade.
    #[default]
    InCirc,

    /// Smooth S-curve: slow start, fast middle, slow end
    SCurve,

    /// Quarter sine, constant perceived loudness
    EqualPower,
}

impl EaseCurve {
    /// Map normalized progress (0.0 to 1.0) through the curve
    #[inline]
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);

        match self {
            EaseCurve::Linear => t,
            EaseCurve::InCirc => 1.0 - (1.0 - t * t).max(0.0).sqrt(),
            EaseCurve::SCurve => (1.0 - (PI * t).cos()) * 0.5,
            EaseCurve::EqualPower => (t * PI * 0.5).sin(),
        }
    }

    /// Human-readable curve name
    pub fn display_name(&self) -> &'static str {
        match self {
            EaseCurve::Linear => "Linear",
            EaseCurve::InCirc => "Circular In",
            EaseCurve::SCurve => "S-Curve",
            EaseCurve::EqualPower => "Equal Power",
        }
    }
}

/// A timed transition between two values
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ease {
    /// Value at the start
    pub from: f32,

    /// Value at the end
    pub to: f32,

    /// Transition length
    pub duration: Duration,

    /// Curve shape
    pub curve: EaseCurve,
}

impl Ease {
    /// Create a transition with the default curve
    pub fn new(from: f32, to: f32, duration: Duration) -> Self {
        Self {
            from,
            to,
            duration,
            curve: EaseCurve::default(),
        }
    }

    /// Use a different curve
    pub fn with_curve(mut self, curve: EaseCurve) -> Self {
        self.curve = curve;
        self
    }

    /// Value after `elapsed` time
    pub fn value_at(&self, elapsed: Duration) -> f32 {
        if self.duration.is_zero() || elapsed >= self.duration {
            return self.to;
        }

        let t = elapsed.as_secs_f32() / self.duration.as_secs_f32();
        self.from + (self.to - self.from) * self.curve.apply(t)
    }

    /// Start sampling this transition lazily
    pub fn sampler(self) -> EaseSampler {
        EaseSampler {
            ease: self,
            started_at: None,
            finished: false,
        }
    }
}

/// Time-driven sample source for an [`Ease`]
#[derive(Debug, Clone)]
pub struct EaseSampler {
    ease: Ease,
    started_at: Option<Instant>,
    finished: bool,
}

impl EaseSampler {
    /// Sample the transition at `now`
    ///
    /// The first call fixes the start time. Returns `None` once the end
    /// value has been handed out.
    pub fn sample(&mut self, now: Instant) -> Option<f32> {
        if self.finished {
            return None;
        }

        let started_at = *self.started_at.get_or_insert(now);
        let elapsed = now.saturating_duration_since(started_at);

        if elapsed >= self.ease.duration {
            self.finished = true;
        }

        Some(self.ease.value_at(elapsed))
    }

    /// Whether the end value has been handed out
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// The transition being sampled
    pub fn ease(&self) -> &Ease {
        &self.ease
    }
}
