//! Classical floor pivots from the previous trading day.
//!
//! ```text
//! P  = (H + L + C) / 3
//! R1 = 2P - L    S1 = 2P - H
//! R2 = P + (H - L)    S2 = P - (H - L)
//! ```
//!
//! H, L, C are the max high, min low and last close of the trading date that
//! immediately precedes the candle's date in the data. The first date in the
//! sequence has no pivots.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::Candle;
use crate::session::SessionClock;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PivotLevels {
    pub p: f64,
    pub r1: f64,
    pub s1: f64,
    pub r2: f64,
    pub s2: f64,
}

impl PivotLevels {
    pub fn from_prior_day(high: f64, low: f64, close: f64) -> Self {
        let p = (high + low + close) / 3.0;
        let range = high - low;
        Self {
            p,
            r1: 2.0 * p - low,
            s1: 2.0 * p - high,
            r2: p + range,
            s2: p - range,
        }
    }
}

/// High/low/close of one trading date.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyAggregate {
    pub date: NaiveDate,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

/// Per-date aggregates in date order. Candles must already be time ordered.
pub fn daily_aggregates(candles: &[Candle], clock: &SessionClock) -> Vec<DailyAggregate> {
    let mut out: Vec<DailyAggregate> = Vec::new();
    for c in candles {
        let date = clock.trading_date(&c.timestamp);
        match out.last_mut() {
            Some(agg) if agg.date == date => {
                agg.high = agg.high.max(c.high);
                agg.low = agg.low.min(c.low);
                agg.close = c.close;
            }
            _ => out.push(DailyAggregate {
                date,
                high: c.high,
                low: c.low,
                close: c.close,
            }),
        }
    }
    out
}

/// Pivot levels broadcast onto every candle of each date.
pub fn daily_pivots(candles: &[Candle], clock: &SessionClock) -> Vec<Option<PivotLevels>> {
    let aggregates = daily_aggregates(candles, clock);
    let mut result = Vec::with_capacity(candles.len());
    let mut day_idx = 0usize;

    for c in candles {
        let date = clock.trading_date(&c.timestamp);
        while day_idx + 1 < aggregates.len() && aggregates[day_idx].date != date {
            day_idx += 1;
        }
        let levels = if day_idx == 0 {
            None
        } else {
            let prev = &aggregates[day_idx - 1];
            Some(PivotLevels::from_prior_day(prev.high, prev.low, prev.close))
        };
        result.push(levels);
    }
    result
}
