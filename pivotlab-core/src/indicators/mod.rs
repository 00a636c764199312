//! Per-candle indicators: EMA, intraday VWAP, daily pivot levels.
//!
//! Indicators are precomputed once over the full candle sequence and merged
//! onto each candle by [`enrich`](crate::enrich::enrich). A value that is not
//! yet available is `None`, never a sentinel.
//!
//! # Look-ahead contamination guard
//! No indicator value at candle t may depend on candle t+1 or later.

pub mod ema;
pub mod pivots;
pub mod vwap;

pub use ema::{ema, Ema};
pub use pivots::{daily_aggregates, daily_pivots, DailyAggregate, PivotLevels};
pub use vwap::{intraday_vwap, IntradayVwap};

use crate::domain::Candle;
use crate::session::SessionClock;

/// Single-series indicator over a candle sequence.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "ema_50", "vwap").
    fn name(&self) -> &str;

    /// Number of candles before the indicator produces output.
    fn lookback(&self) -> usize;

    /// Compute the series. The output has the same length as `candles`.
    fn compute(&self, candles: &[Candle], clock: &SessionClock) -> Vec<Option<f64>>;
}

/// Build 5-minute candles on a single session day from close prices.
///
/// open = previous close (or close for the first candle),
/// high = max(open, close) + 1.0, low = min(open, close) - 1.0, volume = 1000.
#[cfg(test)]
pub fn make_candles(closes: &[f64]) -> Vec<Candle> {
    let clock = SessionClock::default();
    let date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    let start = clock
        .at(date, chrono::NaiveTime::from_hms_opt(9, 15, 0).unwrap())
        .unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Candle {
                timestamp: start + chrono::Duration::minutes(5 * i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000.0,
            }
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
