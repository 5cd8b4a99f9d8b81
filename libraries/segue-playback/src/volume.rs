//! Shared output volume
//!
//! Callers speak 0-100; players are driven with a normalized 0.0-1.0 gain.

/// Volume level with mute that preserves the level
#[derive(Debug, Clone, PartialEq)]
pub struct Volume {
    /// Volume level (0-100)
    level: u8,

    /// Mute state
    muted: bool,
}

impl Volume {
    /// Create a volume at `level` (clamped to 100)
    pub fn new(level: u8) -> Self {
        Self {
            level: level.min(100),
            muted: false,
        }
    }

    /// Set volume level (0-100)
    pub fn set_level(&mut self, level: u8) {
        self.level = level.min(100);
    }

    /// Current volume level (0-100)
    pub fn level(&self) -> u8 {
        self.level
    }

    /// Mute without losing the level
    pub fn mute(&mut self) {
        self.muted = true;
    }

    /// Restore the level
    pub fn unmute(&mut self) {
        self.muted = false;
    }

    /// Toggle mute state
    pub fn toggle_mute(&mut self) {
        self.muted = !self.muted;
    }

    /// Check if muted
    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Normalized gain handed to players
    ///
    /// Returns 0.0 when muted.
    pub fn gain(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            f32::from(self.level) / 100.0
        }
    }
}

impl Default for Volume {
    fn default() -> Self {
        Self::new(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_is_clamped() {
        let mut vol = Volume::new(150);
        assert_eq!(vol.level(), 100);

        vol.set_level(200);
        assert_eq!(vol.level(), 100);
    }

    #[test]
    fn gain_is_normalized() {
        assert_eq!(Volume::new(100).gain(), 1.0);
        assert_eq!(Volume::new(0).gain(), 0.0);
        assert!((Volume::new(40).gain() - 0.4).abs() < 1e-6);
    }

    #[test]
    fn mute_preserves_level() {
        let mut vol = Volume::new(70);
        vol.mute();
        assert!(vol.is_muted());
        assert_eq!(vol.gain(), 0.0);
        assert_eq!(vol.level(), 70);

        vol.toggle_mute();
        assert!(!vol.is_muted());
        assert!((vol.gain() - 0.7).abs() < 1e-6);
    }
}
