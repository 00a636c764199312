//! Ratchet invariant for trailing stops.
//!
//! **Core Rule:** Stops may tighten, never loosen.
//! - Long: stop can only rise (max of current and proposed)
//! - Short: stop can only fall (min of current and proposed)

use crate::domain::Side;

#[derive(Debug, Clone, PartialEq)]
pub struct RatchetState {
    level: f64,
    side: Side,
}

impl RatchetState {
    pub fn new(side: Side, initial_level: f64) -> Self {
        Self {
            level: initial_level,
            side,
        }
    }

    /// Apply a proposed stop and return the ratcheted level.
    ///
    /// ```
    /// use pivotlab_core::domain::Side;
    /// use pivotlab_core::simulator::RatchetState;
    ///
    /// let mut ratchet = RatchetState::new(Side::Long, 95.0);
    /// assert_eq!(ratchet.apply(100.0), 100.0);
    /// assert_eq!(ratchet.apply(90.0), 100.0);
    /// ```
    pub fn apply(&mut self, proposed: f64) -> f64 {
        self.level = match self.side {
            Side::Long => self.level.max(proposed),
            Side::Short => self.level.min(proposed),
        };
        self.level
    }

    pub fn level(&self) -> f64 {
        self.level
    }

    pub fn side(&self) -> Side {
        self.side
    }

    /// True if a candle spanning `low..=high` trades through the stop.
    pub fn is_hit(&self, high: f64, low: f64) -> bool {
        match self.side {
            Side::Long => low <= self.level,
            Side::Short => high >= self.level,
        }
    }
}
