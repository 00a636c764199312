//! Two-lot scale-out trade.
//!
//! Lot 1 exits at a fixed target or the initial stop. Lot 2 shares the
//! initial stop until Lot 1's target is hit, then moves to break-even and
//! trails the previous candle's extreme. Lot 2 has no target.
//!
//! Per candle, in order:
//! 1. excursions (MFE/MAE) are updated from high/low
//! 2. Lot 1 is tested; a candle touching both target and stop is a stop
//!    (`SL_SAME_CANDLE`); a target hit arms Lot 2 immediately
//! 3. Lot 2 trails from the previous scan candle once armed, then is tested
//!    against the stop
//! 4. once both lots are closed no further candles are read
//!
//! Lots still open after the last candle of the day exit `EOD` at its close.

use chrono::{DateTime, FixedOffset};

use super::ratchet::RatchetState;
use crate::domain::{Candle, ExitReason, LotOutcome, Side, Signal, TradeResult};

/// Scale-out tunables.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleOutConfig {
    /// Lot 1 target distance from entry, in points.
    pub target1_points: f64,
}

impl Default for ScaleOutConfig {
    fn default() -> Self {
        Self {
            target1_points: 40.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Exit {
    time: DateTime<FixedOffset>,
    price: f64,
    reason: ExitReason,
}

/// Candle-driven state machine for one signal.
#[derive(Debug, Clone)]
pub struct ScaleOutTrade {
    side: Side,
    entry: f64,
    initial_stop: f64,
    target1: f64,
    runner_stop: RatchetState,
    armed: bool,
    lot1: Option<Exit>,
    lot2: Option<Exit>,
    mfe: f64,
    mae: f64,
    prev_extremes: Option<(f64, f64)>,
    last: Option<(DateTime<FixedOffset>, f64)>,
}

impl ScaleOutTrade {
    pub fn new(side: Side, entry: f64, stop: f64, target1_points: f64) -> Self {
        let target1 = entry + side.sign() * target1_points;
        Self {
            side,
            entry,
            initial_stop: stop,
            target1,
            runner_stop: RatchetState::new(side, stop),
            armed: false,
            lot1: None,
            lot2: None,
            mfe: 0.0,
            mae: 0.0,
            prev_extremes: None,
            last: None,
        }
    }

    pub fn from_signal(signal: &Signal, config: &ScaleOutConfig) -> Self {
        Self::new(
            signal.side,
            signal.fut_entry,
            signal.fut_sl,
            config.target1_points,
        )
    }

    pub fn target1(&self) -> f64 {
        self.target1
    }

    /// Current Lot 2 stop level.
    pub fn runner_stop(&self) -> f64 {
        self.runner_stop.level()
    }

    /// True once Lot 1's target has armed Lot 2's break-even stop.
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn is_closed(&self) -> bool {
        self.lot1.is_some() && self.lot2.is_some()
    }

    /// Process the next candle of the scan. Returns true once both lots are closed.
    ///
    /// Candles passed after the trade is closed are ignored.
    pub fn on_candle(&mut self, candle: &Candle) -> bool {
        if self.is_closed() {
            return true;
        }
        let (high, low) = (candle.high, candle.low);

        // 1. Excursions
        let (favorable, adverse) = match self.side {
            Side::Long => (high - self.entry, self.entry - low),
            Side::Short => (self.entry - low, high - self.entry),
        };
        self.mfe = self.mfe.max(favorable);
        self.mae = self.mae.max(adverse);

        // 2. Lot 1
        if self.lot1.is_none() {
            let (tp_hit, sl_hit) = match self.side {
                Side::Long => (high >= self.target1, low <= self.initial_stop),
                Side::Short => (low <= self.target1, high >= self.initial_stop),
            };
            let exit = match (tp_hit, sl_hit) {
                (true, true) => Some((self.initial_stop, ExitReason::SlSameCandle)),
                (false, true) => Some((self.initial_stop, ExitReason::Sl)),
                (true, false) => Some((self.target1, ExitReason::Tp1)),
                (false, false) => None,
            };
            if let Some((price, reason)) = exit {
                self.lot1 = Some(Exit {
                    time: candle.timestamp,
                    price,
                    reason,
                });
                if reason == ExitReason::Tp1 {
                    self.armed = true;
                    self.runner_stop.apply(self.entry);
                }
            }
        }

        // 3. Lot 2
        if self.lot2.is_none() {
            if self.armed {
                if let Some((prev_high, prev_low)) = self.prev_extremes {
                    let trail = match self.side {
                        Side::Long => prev_low,
                        Side::Short => prev_high,
                    };
                    self.runner_stop.apply(trail);
                }
            }
            if self.runner_stop.is_hit(high, low) {
                self.lot2 = Some(Exit {
                    time: candle.timestamp,
                    price: self.runner_stop.level(),
                    reason: if self.armed {
                        ExitReason::TrailSl
                    } else {
                        ExitReason::InitialSl
                    },
                });
            }
        }

        self.prev_extremes = Some((high, low));
        self.last = Some((candle.timestamp, candle.close));
        self.is_closed()
    }

    /// Resolve the trade. Open lots exit at the last processed candle's close.
    ///
    /// With no processed candles the result is `NO_DATA`.
    pub fn finish(self) -> TradeResult {
        let Some((last_time, last_close)) = self.last else {
            return TradeResult::no_data();
        };
        let eod = Exit {
            time: last_time,
            price: last_close,
            reason: ExitReason::Eod,
        };
        let lot1 = self.lot1.unwrap_or(eod);
        let lot2 = self.lot2.unwrap_or(eod);

        let lot1_pnl = self.side.points(self.entry, lot1.price);
        let lot2_pnl = self.side.points(self.entry, lot2.price);
        let total = lot1_pnl + lot2_pnl;

        TradeResult {
            lot1: LotOutcome::closed(lot1.time, lot1.price, lot1.reason, lot1_pnl),
            lot2: LotOutcome::closed(lot2.time, lot2.price, lot2.reason, lot2_pnl),
            lot2_final_stop: Some(self.runner_stop.level()),
            mfe_points: Some(self.mfe),
            mae_points: Some(self.mae),
            total_points: Some(total),
            effective_points_per_lot: Some(total / 2.0),
        }
    }
}
