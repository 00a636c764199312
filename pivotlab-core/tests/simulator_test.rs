//! End-to-end scale-out and single-exit scenarios.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};
use pivotlab_core::simulator::scan_domain;
use pivotlab_core::{
    simulate_scaleout, simulate_single_exit, Candle, ExitReason, PivotLevel, ScaleOutConfig,
    ScaleOutTrade, SessionClock, Side, Signal, SingleExitReason,
};

// ──────────────────────────────────────────────
// Helpers
// ──────────────────────────────────────────────

fn clock() -> SessionClock {
    SessionClock::default()
}

fn at(day: u32, h: u32, m: u32) -> DateTime<FixedOffset> {
    clock()
        .at(
            NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            NaiveTime::from_hms_opt(h, m, 0).unwrap(),
        )
        .unwrap()
}

/// Candles every 5 minutes from 10:10 on 2024-01-03, given as (o, h, l, c).
fn day_candles(ohlc: &[(f64, f64, f64, f64)]) -> Vec<Candle> {
    ohlc.iter()
        .enumerate()
        .map(|(k, &(open, high, low, close))| Candle {
            timestamp: at(3, 10, 10) + chrono::Duration::minutes(5 * k as i64),
            open,
            high,
            low,
            close,
            volume: 1000.0,
        })
        .collect()
}

/// Signal entering at `candles[0]`.
fn signal(side: Side, entry: f64, stop: f64, candles: &[Candle]) -> Signal {
    let target = entry + side.sign() * 40.0;
    Signal {
        side,
        level: if side == Side::Long {
            PivotLevel::R1
        } else {
            PivotLevel::S1
        },
        level_value: entry,
        signal_time: candles[0].timestamp - chrono::Duration::minutes(10),
        entry_time: candles[0].timestamp,
        signal_close: entry,
        fut_entry: entry,
        fut_sl: stop,
        fut_tp: target,
        signal_idx: 0,
        confirm_idx: 0,
        entry_idx: 0,
    }
}

fn run(signal: &Signal, candles: &[Candle]) -> pivotlab_core::TradeResult {
    simulate_scaleout(signal, candles, &ScaleOutConfig::default(), &clock()).unwrap()
}

// ──────────────────────────────────────────────
// Scale-out scenarios
// ──────────────────────────────────────────────

#[test]
fn stop_before_target_loses_both_lots() {
    let candles = day_candles(&[
        (100.0, 105.0, 95.0, 98.0),
        (98.0, 99.0, 89.0, 91.0),
        (91.0, 141.0, 90.5, 140.0),
    ]);
    let r = run(&signal(Side::Long, 100.0, 90.0, &candles), &candles);

    assert_eq!(r.lot1.reason, ExitReason::Sl);
    assert_eq!(r.lot1.exit_price, Some(90.0));
    assert_eq!(r.lot1.pnl_points, Some(-10.0));
    assert_eq!(r.lot2.reason, ExitReason::InitialSl);
    assert_eq!(r.lot2.exit_price, Some(90.0));
    assert_eq!(r.lot2.pnl_points, Some(-10.0));
    assert_eq!(r.total_points, Some(-20.0));
    assert_eq!(r.effective_points_per_lot, Some(-10.0));
    assert_eq!(r.lot1.exit_time, Some(candles[1].timestamp));
    // Scan stopped at candle 1; the later rally never counts toward MFE.
    assert_eq!(r.mfe_points, Some(5.0));
    assert_eq!(r.mae_points, Some(11.0));
}

#[test]
fn target_then_trailing_exit() {
    let candles = day_candles(&[
        (100.0, 110.0, 95.0, 108.0),
        (108.0, 140.0, 105.0, 138.0),
        (138.0, 145.0, 130.0, 142.0),
        (142.0, 143.0, 120.0, 125.0),
        (125.0, 126.0, 110.0, 112.0),
    ]);
    let r = run(&signal(Side::Long, 100.0, 90.0, &candles), &candles);

    assert_eq!(r.lot1.reason, ExitReason::Tp1);
    assert_eq!(r.lot1.exit_price, Some(140.0));
    assert_eq!(r.lot1.pnl_points, Some(40.0));
    assert_eq!(r.lot2.reason, ExitReason::TrailSl);
    assert_eq!(r.lot2.exit_price, Some(130.0));
    assert_eq!(r.lot2.exit_time, Some(candles[3].timestamp));
    assert_eq!(r.lot2_final_stop, Some(130.0));
    assert_eq!(r.total_points, Some(70.0));
    assert_eq!(r.effective_points_per_lot, Some(35.0));
    assert_eq!(r.mfe_points, Some(45.0));
}

#[test]
fn runner_exit_never_below_recorded_stop() {
    let candles = day_candles(&[
        (100.0, 110.0, 95.0, 108.0),
        (108.0, 140.0, 105.0, 138.0),
        (138.0, 145.0, 130.0, 142.0),
        (142.0, 150.0, 135.0, 148.0),
        (148.0, 149.0, 137.0, 140.0),
    ]);
    let sig = signal(Side::Long, 100.0, 90.0, &candles);
    let mut trade = ScaleOutTrade::from_signal(&sig, &ScaleOutConfig::default());
    let mut recorded = Vec::new();
    for c in &candles {
        let closed = trade.on_candle(c);
        if trade.is_armed() {
            recorded.push(trade.runner_stop());
        }
        if closed {
            break;
        }
    }
    assert_eq!(recorded.first(), Some(&100.0));
    assert!(recorded.windows(2).all(|w| w[1] >= w[0]));

    let r = trade.finish();
    let exit = r.lot2.exit_price.unwrap();
    assert!(recorded.iter().all(|&s| exit >= s));
    assert!(matches!(r.lot2.reason, ExitReason::TrailSl | ExitReason::Eod));
}

#[test]
fn same_candle_touch_resolves_to_stop() {
    let candles = day_candles(&[(100.0, 141.0, 89.0, 120.0)]);
    let r = run(&signal(Side::Long, 100.0, 90.0, &candles), &candles);
    assert_eq!(r.lot1.reason, ExitReason::SlSameCandle);
    assert_eq!(r.lot1.exit_price, Some(90.0));
    assert_eq!(r.lot2.reason, ExitReason::InitialSl);
    assert_eq!(r.total_points, Some(-20.0));
}

#[test]
fn short_same_candle_touch_resolves_to_stop() {
    let candles = day_candles(&[(100.0, 111.0, 59.0, 80.0)]);
    let r = run(&signal(Side::Short, 100.0, 110.0, &candles), &candles);
    assert_eq!(r.lot1.reason, ExitReason::SlSameCandle);
    assert_eq!(r.lot1.exit_price, Some(110.0));
    assert_eq!(r.lot1.pnl_points, Some(-10.0));
}

#[test]
fn untouched_entry_candle_exits_eod_long() {
    let candles = day_candles(&[(100.0, 105.0, 95.0, 102.0)]);
    let r = run(&signal(Side::Long, 100.0, 90.0, &candles), &candles);
    for lot in [&r.lot1, &r.lot2] {
        assert_eq!(lot.reason, ExitReason::Eod);
        assert_eq!(lot.exit_price, Some(102.0));
        assert_eq!(lot.pnl_points, Some(2.0));
        assert_eq!(lot.exit_time, Some(candles[0].timestamp));
    }
    assert_eq!(r.total_points, Some(4.0));
}

#[test]
fn untouched_entry_candle_exits_eod_short() {
    let candles = day_candles(&[(100.0, 105.0, 95.0, 97.0)]);
    let r = run(&signal(Side::Short, 100.0, 110.0, &candles), &candles);
    assert_eq!(r.lot1.reason, ExitReason::Eod);
    assert_eq!(r.lot2.reason, ExitReason::Eod);
    assert_eq!(r.lot1.pnl_points, Some(3.0));
    assert_eq!(r.lot2.pnl_points, Some(3.0));
}

#[test]
fn eod_uses_last_candle_of_entry_day_only() {
    let mut candles = day_candles(&[(100.0, 105.0, 95.0, 101.0), (101.0, 104.0, 96.0, 103.0)]);
    // Next session trades straight through the target.
    candles.push(Candle {
        timestamp: at(4, 9, 15),
        open: 103.0,
        high: 160.0,
        low: 102.0,
        close: 155.0,
        volume: 1000.0,
    });
    let sig = signal(Side::Long, 100.0, 90.0, &candles);
    assert_eq!(scan_domain(&sig, &candles, &clock()).unwrap().len(), 2);

    let r = run(&sig, &candles);
    assert_eq!(r.lot1.reason, ExitReason::Eod);
    assert_eq!(r.lot1.exit_price, Some(103.0));
    assert_eq!(r.lot1.exit_time, Some(candles[1].timestamp));
}

#[test]
fn tp1_then_eod_keeps_runner_at_close() {
    let candles = day_candles(&[
        (100.0, 141.0, 100.5, 138.0),
        (138.0, 150.0, 136.0, 149.0),
    ]);
    let r = run(&signal(Side::Long, 100.0, 90.0, &candles), &candles);
    assert_eq!(r.lot1.reason, ExitReason::Tp1);
    assert_eq!(r.lot2.reason, ExitReason::Eod);
    assert_eq!(r.lot2.exit_price, Some(149.0));
    // Trailed to the first candle's low.
    assert_eq!(r.lot2_final_stop, Some(100.5));
}

#[test]
fn simulation_is_deterministic() {
    let candles = day_candles(&[
        (100.0, 110.0, 95.0, 108.0),
        (108.0, 140.0, 105.0, 138.0),
        (138.0, 145.0, 130.0, 142.0),
    ]);
    let sig = signal(Side::Long, 100.0, 90.0, &candles);
    assert_eq!(run(&sig, &candles), run(&sig, &candles));
}

// ──────────────────────────────────────────────
// Single-exit
// ──────────────────────────────────────────────

#[test]
fn single_exit_long_stop_first() {
    let candles = day_candles(&[
        (100.0, 105.0, 95.0, 98.0),
        (98.0, 99.0, 89.0, 91.0),
    ]);
    let r = simulate_single_exit(&signal(Side::Long, 100.0, 90.0, &candles), &candles, &clock())
        .unwrap();
    assert_eq!(r.reason, SingleExitReason::Sl);
    assert_eq!(r.exit_price, Some(90.0));
    assert_eq!(r.pnl_points, Some(-10.0));
    assert_eq!(r.win, Some(false));
}

#[test]
fn single_exit_long_target() {
    let candles = day_candles(&[
        (100.0, 105.0, 95.0, 98.0),
        (98.0, 142.0, 97.0, 141.0),
    ]);
    let r = simulate_single_exit(&signal(Side::Long, 100.0, 90.0, &candles), &candles, &clock())
        .unwrap();
    assert_eq!(r.reason, SingleExitReason::Tp);
    assert_eq!(r.exit_price, Some(140.0));
    assert_eq!(r.win, Some(true));
}
