//! Single-exit simulator: one lot, the signal's own target and stop.
//!
//! Same scan domain and stop-first tie-break as the scale-out simulator,
//! without break-even or trailing.

use super::{check_signal, scan_domain, SimulationError};
use crate::domain::{Candle, Side, Signal, SingleExitReason, SingleExitResult};
use crate::session::SessionClock;

pub fn simulate_single_exit(
    signal: &Signal,
    candles: &[Candle],
    clock: &SessionClock,
) -> Result<SingleExitResult, SimulationError> {
    check_signal(signal)?;
    let scan = scan_domain(signal, candles, clock)?;
    let Some(last) = scan.last() else {
        return Ok(SingleExitResult::no_data());
    };

    let (tp, sl) = (signal.fut_tp, signal.fut_sl);
    let mut exit = None;
    for c in scan {
        let (tp_hit, sl_hit) = match signal.side {
            Side::Long => (c.high >= tp, c.low <= sl),
            Side::Short => (c.low <= tp, c.high >= sl),
        };
        exit = match (tp_hit, sl_hit) {
            (true, true) => Some((c.timestamp, sl, SingleExitReason::SlSameCandle)),
            (false, true) => Some((c.timestamp, sl, SingleExitReason::Sl)),
            (true, false) => Some((c.timestamp, tp, SingleExitReason::Tp)),
            (false, false) => None,
        };
        if exit.is_some() {
            break;
        }
    }
    let (time, price, reason) =
        exit.unwrap_or((last.timestamp, last.close, SingleExitReason::Eod));
    let pnl = signal.side.points(signal.fut_entry, price);

    Ok(SingleExitResult {
        exit_time: Some(time),
        exit_price: Some(price),
        reason,
        pnl_points: Some(pnl),
        win: Some(pnl > 0.0),
    })
}
