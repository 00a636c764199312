//! Candle — the fundamental intraday market data unit.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// OHLCV candle for a single interval.
///
/// Timestamps carry their own UTC offset; the trading date is always derived
/// through a [`SessionClock`](crate::session::SessionClock), never from the
/// offset stored here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: DateTime<FixedOffset>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    /// Returns true if any OHLCV field is NaN or infinite.
    pub fn has_non_finite(&self) -> bool {
        !(self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite()
            && self.volume.is_finite())
    }

    /// OHLC consistency: high bounds open/close/low from above, low from below.
    pub fn is_sane(&self) -> bool {
        if self.has_non_finite() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
    }

    /// Typical price `(high + low + close) / 3`, the VWAP weight basis.
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }
}
