//! Breakout, confirmation and trend-filter checks for one pivot level.

use crate::domain::Side;
use crate::enrich::EnrichedCandle;

/// Outcome of checking one level in one window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakoutCheck {
    Pass,
    /// Close did not cross the level on the signal candle.
    NoBreakout,
    /// Confirmation candle revisited the level.
    NotConfirmed,
    /// VWAP or an EMA is not yet defined at the signal candle.
    TrendUndefined,
    /// Close, VWAP and EMAs are not stacked in the breakout direction.
    TrendMisaligned,
}

/// Check the breakout pattern of `level` across `prev`, `sig`, `confirm`.
///
/// LONG: `prev.close <= level < sig.close`, `confirm.low > level`,
/// `close > vwap`, `close > ema_fast`, `ema_fast > ema_slow`.
/// SHORT mirrors every comparison.
pub fn check_breakout(
    side: Side,
    level: f64,
    prev: &EnrichedCandle,
    sig: &EnrichedCandle,
    confirm: &EnrichedCandle,
) -> BreakoutCheck {
    let close = sig.candle.close;
    let crossed = match side {
        Side::Long => close > level && prev.candle.close <= level,
        Side::Short => close < level && prev.candle.close >= level,
    };
    if !crossed {
        return BreakoutCheck::NoBreakout;
    }

    let held = match side {
        Side::Long => confirm.candle.low > level,
        Side::Short => confirm.candle.high < level,
    };
    if !held {
        return BreakoutCheck::NotConfirmed;
    }

    let (Some(vwap), Some(fast), Some(slow)) = (sig.vwap, sig.ema_fast, sig.ema_slow) else {
        return BreakoutCheck::TrendUndefined;
    };
    let aligned = match side {
        Side::Long => close > vwap && close > fast && fast > slow,
        Side::Short => close < vwap && close < fast && fast < slow,
    };
    if !aligned {
        return BreakoutCheck::TrendMisaligned;
    }

    BreakoutCheck::Pass
}
