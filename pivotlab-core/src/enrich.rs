//! Candle validation and indicator enrichment.
//!
//! `enrich` is the single entry from raw candles into the signal engine: it
//! rejects structurally broken input and attaches EMA, VWAP and pivot values
//! to every candle, preserving order and cardinality.

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::Serialize;
use thiserror::Error;

use crate::domain::Candle;
use crate::indicators::{daily_pivots, Ema, Indicator, IntradayVwap, PivotLevels};
use crate::session::SessionClock;

/// Structural problems in a candle sequence.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CandleError {
    #[error("candle {index} at {current} is not after previous candle at {previous}")]
    NonMonotonic {
        index: usize,
        previous: DateTime<FixedOffset>,
        current: DateTime<FixedOffset>,
    },
    #[error("candle {index} duplicates timestamp {timestamp}")]
    Duplicate {
        index: usize,
        timestamp: DateTime<FixedOffset>,
    },
    #[error("candle {index} at {timestamp} has non-finite fields")]
    NonFinite {
        index: usize,
        timestamp: DateTime<FixedOffset>,
    },
    #[error("candle {index} at {timestamp} has inconsistent OHLC")]
    InvalidOhlc {
        index: usize,
        timestamp: DateTime<FixedOffset>,
    },
    #[error("candle {index} at {timestamp} has negative volume {volume}")]
    NegativeVolume {
        index: usize,
        timestamp: DateTime<FixedOffset>,
        volume: f64,
    },
}

impl CandleError {
    /// Position of the offending candle.
    pub fn index(&self) -> usize {
        match self {
            CandleError::NonMonotonic { index, .. }
            | CandleError::Duplicate { index, .. }
            | CandleError::NonFinite { index, .. }
            | CandleError::InvalidOhlc { index, .. }
            | CandleError::NegativeVolume { index, .. } => *index,
        }
    }

    /// Timestamp of the offending candle.
    pub fn timestamp(&self) -> DateTime<FixedOffset> {
        match self {
            CandleError::NonMonotonic { current, .. } => *current,
            CandleError::Duplicate { timestamp, .. }
            | CandleError::NonFinite { timestamp, .. }
            | CandleError::InvalidOhlc { timestamp, .. }
            | CandleError::NegativeVolume { timestamp, .. } => *timestamp,
        }
    }
}

/// Check ordering and per-candle sanity. Stops at the first problem.
pub fn validate_candles(candles: &[Candle]) -> Result<(), CandleError> {
    for (index, c) in candles.iter().enumerate() {
        if c.has_non_finite() {
            return Err(CandleError::NonFinite {
                index,
                timestamp: c.timestamp,
            });
        }
        if c.volume < 0.0 {
            return Err(CandleError::NegativeVolume {
                index,
                timestamp: c.timestamp,
                volume: c.volume,
            });
        }
        if !c.is_sane() {
            return Err(CandleError::InvalidOhlc {
                index,
                timestamp: c.timestamp,
            });
        }
        if index > 0 {
            let previous = candles[index - 1].timestamp;
            if c.timestamp == previous {
                return Err(CandleError::Duplicate {
                    index,
                    timestamp: c.timestamp,
                });
            }
            if c.timestamp < previous {
                return Err(CandleError::NonMonotonic {
                    index,
                    previous,
                    current: c.timestamp,
                });
            }
        }
    }
    Ok(())
}

/// EMA periods used for the trend filter.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorConfig {
    pub ema_fast: usize,
    pub ema_slow: usize,
    /// Values before this many candles are reported as `None`. 0 disables.
    pub ema_min_periods: usize,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            ema_fast: 50,
            ema_slow: 222,
            ema_min_periods: 0,
        }
    }
}

/// Candle plus the indicator values the signal engine reads.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedCandle {
    pub candle: Candle,
    pub trading_date: NaiveDate,
    pub ema_fast: Option<f64>,
    pub ema_slow: Option<f64>,
    pub vwap: Option<f64>,
    pub pivots: Option<PivotLevels>,
}

/// Validate `candles` and merge all indicators onto them.
pub fn enrich(
    candles: &[Candle],
    clock: &SessionClock,
    config: &IndicatorConfig,
) -> Result<Vec<EnrichedCandle>, CandleError> {
    validate_candles(candles)?;

    let ema_fast = Ema::new(config.ema_fast.max(1))
        .with_min_periods(config.ema_min_periods)
        .compute(candles, clock);
    let ema_slow = Ema::new(config.ema_slow.max(1))
        .with_min_periods(config.ema_min_periods)
        .compute(candles, clock);
    let vwap = IntradayVwap::new().compute(candles, clock);
    let pivots = daily_pivots(candles, clock);

    let enriched = candles
        .iter()
        .enumerate()
        .map(|(i, c)| EnrichedCandle {
            candle: c.clone(),
            trading_date: clock.trading_date(&c.timestamp),
            ema_fast: ema_fast[i],
            ema_slow: ema_slow[i],
            vwap: vwap[i],
            pivots: pivots[i],
        })
        .collect();

    Ok(enriched)
}
