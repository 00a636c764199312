//! Trade simulators.
//!
//! Both simulators are pure functions of (signal, candles): no state is
//! shared between invocations, so signals can be simulated in any order or
//! in parallel with bit-identical results.
//!
//! The scan domain of a signal is every candle at or after its entry time
//! that falls on the entry's trading date.

pub mod ratchet;
pub mod scaleout;
pub mod single;

pub use ratchet::RatchetState;
pub use scaleout::{ScaleOutConfig, ScaleOutTrade};
pub use single::simulate_single_exit;

use chrono::{DateTime, FixedOffset};
use thiserror::Error;

use crate::domain::{Candle, Side, Signal, TradeResult};
use crate::session::SessionClock;

/// Signals the simulators refuse to replay.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimulationError {
    #[error("{side} signal at {entry_time} has stop {stop} on the wrong side of entry {entry}")]
    InvalidRisk {
        side: Side,
        entry_time: DateTime<FixedOffset>,
        entry: f64,
        stop: f64,
    },
    #[error("signal at {entry_time} has non-finite prices")]
    NonFinitePrice { entry_time: DateTime<FixedOffset> },
    #[error("target distance must be positive and finite, got {0}")]
    InvalidTarget(f64),
    #[error("candles out of order at index {index}: {current} does not follow {previous}")]
    UnsortedCandles {
        index: usize,
        previous: DateTime<FixedOffset>,
        current: DateTime<FixedOffset>,
    },
}

fn check_sorted(candles: &[Candle], offset: usize) -> Result<(), SimulationError> {
    match candles
        .windows(2)
        .position(|w| w[1].timestamp <= w[0].timestamp)
    {
        Some(i) => Err(SimulationError::UnsortedCandles {
            index: offset + i + 1,
            previous: candles[i].timestamp,
            current: candles[i + 1].timestamp,
        }),
        None => Ok(()),
    }
}

fn check_signal(signal: &Signal) -> Result<(), SimulationError> {
    if !(signal.fut_entry.is_finite() && signal.fut_sl.is_finite() && signal.fut_tp.is_finite()) {
        return Err(SimulationError::NonFinitePrice {
            entry_time: signal.entry_time,
        });
    }
    if !signal.has_valid_risk() {
        return Err(SimulationError::InvalidRisk {
            side: signal.side,
            entry_time: signal.entry_time,
            entry: signal.fut_entry,
            stop: signal.fut_sl,
        });
    }
    Ok(())
}

/// Candles from the signal's entry to the end of its trading date.
///
/// `candles` must be strictly increasing in time. `signal.entry_idx` is used
/// directly when it points at the entry candle; otherwise the entry is
/// located by time, so any series covering the same session works.
///
/// Returns `UnsortedCandles` when the domain is out of order, or when the
/// entry has to be located by time in a slice that is out of order.
pub fn scan_domain<'a>(
    signal: &Signal,
    candles: &'a [Candle],
    clock: &SessionClock,
) -> Result<&'a [Candle], SimulationError> {
    let start = match candles.get(signal.entry_idx) {
        Some(c) if c.timestamp == signal.entry_time => signal.entry_idx,
        _ => {
            check_sorted(candles, 0)?;
            candles.partition_point(|c| c.timestamp < signal.entry_time)
        }
    };
    let entry_date = clock.trading_date(&signal.entry_time);
    let len = candles[start..]
        .iter()
        .take_while(|c| clock.trading_date(&c.timestamp) == entry_date)
        .count();
    let domain = &candles[start..start + len];
    check_sorted(domain, start)?;
    Ok(domain)
}

/// Replay a signal through the two-lot scale-out policy.
pub fn simulate_scaleout(
    signal: &Signal,
    candles: &[Candle],
    config: &ScaleOutConfig,
    clock: &SessionClock,
) -> Result<TradeResult, SimulationError> {
    check_signal(signal)?;
    if !(config.target1_points.is_finite() && config.target1_points > 0.0) {
        return Err(SimulationError::InvalidTarget(config.target1_points));
    }

    let mut trade = ScaleOutTrade::from_signal(signal, config);
    for candle in scan_domain(signal, candles, clock)? {
        if trade.on_candle(candle) {
            break;
        }
    }
    Ok(trade.finish())
}
