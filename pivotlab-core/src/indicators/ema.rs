//! Exponential Moving Average (EMA) of closes.
//!
//! Recursive: EMA[t] = alpha * close[t] + (1 - alpha) * EMA[t-1], alpha = 2/(period+1).
//! Seed: EMA[0] = close[0]. There is no SMA warm-up window; the recursion runs
//! continuously across session days.
//!
//! `min_periods` optionally hides the first `min_periods - 1` values as `None`
//! without changing the recursion itself.

use super::Indicator;
use crate::domain::Candle;
use crate::session::SessionClock;

#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
    min_periods: usize,
    name: String,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "EMA period must be >= 1");
        Self {
            period,
            min_periods: 0,
            name: format!("ema_{period}"),
        }
    }

    pub fn with_min_periods(mut self, min_periods: usize) -> Self {
        self.min_periods = min_periods;
        self
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

impl Indicator for Ema {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.min_periods.saturating_sub(1)
    }

    fn compute(&self, candles: &[Candle], _clock: &SessionClock) -> Vec<Option<f64>> {
        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        ema(&closes, self.period, self.min_periods)
    }
}

/// EMA of an arbitrary series, seeded from its first value.
///
/// The first `min_periods - 1` outputs are `None`. A non-finite input makes
/// that value and everything after it `None`.
pub fn ema(values: &[f64], period: usize, min_periods: usize) -> Vec<Option<f64>> {
    let mut result = vec![None; values.len()];
    if period == 0 {
        return result;
    }
    let alpha = 2.0 / (period as f64 + 1.0);

    let mut prev: Option<f64> = None;
    for (i, &v) in values.iter().enumerate() {
        if !v.is_finite() {
            return result;
        }
        let ema = match prev {
            None => v,
            Some(p) => alpha * v + (1.0 - alpha) * p,
        };
        prev = Some(ema);
        if i + 1 >= min_periods {
            result[i] = Some(ema);
        }
    }
    result
}
