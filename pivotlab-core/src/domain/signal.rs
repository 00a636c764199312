//! Signal — an immutable breakout-and-confirmation record.

use std::fmt;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::indicators::PivotLevels;

/// Trade direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Side {
    Long,
    Short,
}

impl Side {
    /// +1 for long, -1 for short.
    pub fn sign(self) -> f64 {
        match self {
            Side::Long => 1.0,
            Side::Short => -1.0,
        }
    }

    /// Signed move in the trade's favor from `entry` to `price`.
    pub fn points(self, entry: f64, price: f64) -> f64 {
        (price - entry) * self.sign()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Side::Long => "LONG",
            Side::Short => "SHORT",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named pivot level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PivotLevel {
    P,
    R1,
    R2,
    S1,
    S2,
}

impl PivotLevel {
    /// Breakout levels evaluated for long entries, in emission order.
    pub const LONG_LEVELS: [PivotLevel; 2] = [PivotLevel::R1, PivotLevel::R2];
    /// Breakout levels evaluated for short entries, in emission order.
    pub const SHORT_LEVELS: [PivotLevel; 2] = [PivotLevel::S1, PivotLevel::S2];

    pub fn value(self, levels: &PivotLevels) -> f64 {
        match self {
            PivotLevel::P => levels.p,
            PivotLevel::R1 => levels.r1,
            PivotLevel::R2 => levels.r2,
            PivotLevel::S1 => levels.s1,
            PivotLevel::S2 => levels.s2,
        }
    }

    /// The side whose breakouts this level can trigger, if any.
    pub fn breakout_side(self) -> Option<Side> {
        match self {
            PivotLevel::R1 | PivotLevel::R2 => Some(Side::Long),
            PivotLevel::S1 | PivotLevel::S2 => Some(Side::Short),
            PivotLevel::P => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PivotLevel::P => "P",
            PivotLevel::R1 => "R1",
            PivotLevel::R2 => "R2",
            PivotLevel::S1 => "S1",
            PivotLevel::S2 => "S2",
        }
    }
}

impl fmt::Display for PivotLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A detected breakout with its derived entry, stop and target prices.
///
/// Indices point into the enriched candle sequence the signal was generated
/// from: `signal_idx` is the breakout candle, `confirm_idx = signal_idx + 1`
/// and `entry_idx = signal_idx + 2`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub side: Side,
    pub level: PivotLevel,
    pub level_value: f64,
    pub signal_time: DateTime<FixedOffset>,
    pub entry_time: DateTime<FixedOffset>,
    /// Close of the breakout candle.
    pub signal_close: f64,
    pub fut_entry: f64,
    pub fut_sl: f64,
    pub fut_tp: f64,
    pub signal_idx: usize,
    pub confirm_idx: usize,
    pub entry_idx: usize,
}

impl Signal {
    /// Distance between entry and stop in price points.
    pub fn risk_points(&self) -> f64 {
        (self.fut_entry - self.fut_sl).abs()
    }

    /// Reward-to-risk of the given target distance. `None` when risk is zero.
    pub fn reward_risk(&self, target_points: f64) -> Option<f64> {
        let risk = self.risk_points();
        if risk > 0.0 {
            Some(target_points / risk)
        } else {
            None
        }
    }

    /// True when the stop sits strictly on the losing side of entry.
    pub fn has_valid_risk(&self) -> bool {
        match self.side {
            Side::Long => self.fut_sl < self.fut_entry,
            Side::Short => self.fut_sl > self.fut_entry,
        }
    }
}
