//! Trade results produced by the simulators.

use std::fmt;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Why a lot left the market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExitReason {
    /// Lot 1 target reached.
    Tp1,
    /// Lot 1 stop reached, target untouched.
    Sl,
    /// Lot 1 stop and target touched by the same candle; resolved as the stop.
    SlSameCandle,
    /// Lot 2 stopped before break-even was armed.
    InitialSl,
    /// Lot 2 stopped after break-even or trailing was armed.
    TrailSl,
    /// Still open at the last candle of the entry day.
    Eod,
    /// No candles on or after the entry time for the entry day.
    NoData,
}

impl ExitReason {
    pub fn as_str(self) -> &'static str {
        match self {
            ExitReason::Tp1 => "TP1",
            ExitReason::Sl => "SL",
            ExitReason::SlSameCandle => "SL_SAME_CANDLE",
            ExitReason::InitialSl => "INITIAL_SL",
            ExitReason::TrailSl => "TRAIL_SL",
            ExitReason::Eod => "EOD",
            ExitReason::NoData => "NO_DATA",
        }
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exit resolution of one lot.
///
/// All fields except `reason` are `None` for [`ExitReason::NoData`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LotOutcome {
    pub exit_time: Option<DateTime<FixedOffset>>,
    pub exit_price: Option<f64>,
    pub reason: ExitReason,
    pub pnl_points: Option<f64>,
}

impl LotOutcome {
    pub fn closed(
        exit_time: DateTime<FixedOffset>,
        exit_price: f64,
        reason: ExitReason,
        pnl_points: f64,
    ) -> Self {
        Self {
            exit_time: Some(exit_time),
            exit_price: Some(exit_price),
            reason,
            pnl_points: Some(pnl_points),
        }
    }

    pub fn no_data() -> Self {
        Self {
            exit_time: None,
            exit_price: None,
            reason: ExitReason::NoData,
            pnl_points: None,
        }
    }
}

/// Two-lot scale-out resolution of a single signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeResult {
    pub lot1: LotOutcome,
    pub lot2: LotOutcome,
    /// Lot 2 stop level in force when the lot closed.
    pub lot2_final_stop: Option<f64>,
    pub mfe_points: Option<f64>,
    pub mae_points: Option<f64>,
    /// Sum of both lots' points.
    pub total_points: Option<f64>,
    /// `total_points / 2`.
    pub effective_points_per_lot: Option<f64>,
}

impl TradeResult {
    pub fn no_data() -> Self {
        Self {
            lot1: LotOutcome::no_data(),
            lot2: LotOutcome::no_data(),
            lot2_final_stop: None,
            mfe_points: None,
            mae_points: None,
            total_points: None,
            effective_points_per_lot: None,
        }
    }

    pub fn is_no_data(&self) -> bool {
        self.lot1.reason == ExitReason::NoData
    }

    pub fn hit_tp1(&self) -> bool {
        self.lot1.reason == ExitReason::Tp1
    }

    /// Combined exit pattern, e.g. `"TP1 | TRAIL_SL"`.
    pub fn exit_pattern(&self) -> String {
        format!("{} | {}", self.lot1.reason, self.lot2.reason)
    }
}

/// Why a single-exit position closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SingleExitReason {
    Tp,
    Sl,
    SlSameCandle,
    Eod,
    NoData,
}

impl SingleExitReason {
    pub fn as_str(self) -> &'static str {
        match self {
            SingleExitReason::Tp => "TP",
            SingleExitReason::Sl => "SL",
            SingleExitReason::SlSameCandle => "SL_SAME_CANDLE",
            SingleExitReason::Eod => "EOD",
            SingleExitReason::NoData => "NO_DATA",
        }
    }
}

impl fmt::Display for SingleExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One-lot resolution of a signal using its own target and stop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingleExitResult {
    pub exit_time: Option<DateTime<FixedOffset>>,
    pub exit_price: Option<f64>,
    pub reason: SingleExitReason,
    pub pnl_points: Option<f64>,
    pub win: Option<bool>,
}

impl SingleExitResult {
    pub fn no_data() -> Self {
        Self {
            exit_time: None,
            exit_price: None,
            reason: SingleExitReason::NoData,
            pnl_points: None,
            win: None,
        }
    }

    pub fn is_no_data(&self) -> bool {
        self.reason == SingleExitReason::NoData
    }
}
