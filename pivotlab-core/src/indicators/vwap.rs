//! Intraday cumulative VWAP.
//!
//! VWAP[t] = sum(typical * volume) / sum(volume) over the candles of t's
//! trading date up to and including t. Resets on every new trading date.
//! Undefined while cumulative volume is zero.

use super::Indicator;
use crate::domain::Candle;
use crate::session::SessionClock;

#[derive(Debug, Clone, Default)]
pub struct IntradayVwap;

impl IntradayVwap {
    pub fn new() -> Self {
        Self
    }
}

impl Indicator for IntradayVwap {
    fn name(&self) -> &str {
        "vwap"
    }

    fn lookback(&self) -> usize {
        0
    }

    fn compute(&self, candles: &[Candle], clock: &SessionClock) -> Vec<Option<f64>> {
        intraday_vwap(candles, clock)
    }
}

/// Session-resetting VWAP of `candles`, one value per candle.
pub fn intraday_vwap(candles: &[Candle], clock: &SessionClock) -> Vec<Option<f64>> {
    let mut result = Vec::with_capacity(candles.len());
    let mut day = None;
    let mut cum_pv = 0.0;
    let mut cum_vol = 0.0;

    for c in candles {
        let date = clock.trading_date(&c.timestamp);
        if day != Some(date) {
            day = Some(date);
            cum_pv = 0.0;
            cum_vol = 0.0;
        }
        cum_pv += c.typical_price() * c.volume;
        cum_vol += c.volume;
        result.push(if cum_vol == 0.0 {
            None
        } else {
            Some(cum_pv / cum_vol)
        });
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_candles, DEFAULT_EPSILON};

    #[test]
    fn vwap_single_candle_is_typical_price() {
        let candles = make_candles(&[100.0]);
        let result = IntradayVwap::new().compute(&candles, &SessionClock::default());
        assert_approx(result[0].unwrap(), candles[0].typical_price(), DEFAULT_EPSILON);
    }

    #[test]
    fn vwap_weights_by_volume() {
        let mut candles = make_candles(&[100.0, 110.0]);
        candles[0].volume = 1.0;
        candles[1].volume = 3.0;
        let tp0 = candles[0].typical_price();
        let tp1 = candles[1].typical_price();
        let result = IntradayVwap::new().compute(&candles, &SessionClock::default());
        assert_approx(result[1].unwrap(), (tp0 + 3.0 * tp1) / 4.0, DEFAULT_EPSILON);
    }

    #[test]
    fn vwap_zero_volume_is_undefined_until_volume_trades() {
        let mut candles = make_candles(&[100.0, 101.0, 102.0]);
        candles[0].volume = 0.0;
        candles[1].volume = 0.0;
        let result = IntradayVwap::new().compute(&candles, &SessionClock::default());
        assert_eq!(result[0], None);
        assert_eq!(result[1], None);
        assert_approx(result[2].unwrap(), candles[2].typical_price(), DEFAULT_EPSILON);
    }

    #[test]
    fn vwap_resets_each_trading_date() {
        let mut candles = make_candles(&[100.0, 200.0]);
        candles[1].timestamp += chrono::Duration::days(1);
        let result = IntradayVwap::new().compute(&candles, &SessionClock::default());
        assert_approx(result[1].unwrap(), candles[1].typical_price(), DEFAULT_EPSILON);
    }
}
