//! Shared fixture: two sessions that produce exactly one R1 breakout.
//!
//! Day 1 (2024-01-02) has H=110 L=90 C=100, so day 2 pivots are
//! P=100, R1=110, R2=120, S1=90, S2=80. On day 2 the 10:00 candle closes
//! above R1, 10:05 confirms, and the trade enters at the 10:10 open (115)
//! with stop 104 and a 10-point Lot 1 target (125).
//!
//! Expected resolution: Lot 1 `TP1` at 10:15 (+10), Lot 2 `TRAIL_SL` at
//! 117 on 10:25 (+2), total +12.

#![allow(dead_code)]

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime};
use pivotlab_core::{Candle, SessionClock};
use pivotlab_runner::BacktestConfig;

pub fn ts(day: u32, h: u32, m: u32) -> DateTime<FixedOffset> {
    SessionClock::default()
        .at(
            NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            NaiveTime::from_hms_opt(h, m, 0).unwrap(),
        )
        .unwrap()
}

fn candle(at: DateTime<FixedOffset>, o: f64, h: f64, l: f64, c: f64) -> Candle {
    Candle {
        timestamp: at,
        open: o,
        high: h,
        low: l,
        close: c,
        volume: 1000.0,
    }
}

pub fn fixture_config() -> BacktestConfig {
    BacktestConfig::from_toml(
        r#"
[indicators]
ema_fast = 2
ema_slow = 5

[signal]
target_points = 10.0

[scaleout]
target1_points = 10.0
"#,
    )
    .unwrap()
}

pub fn fixture_candles() -> Vec<Candle> {
    let mut out = Vec::new();

    // Day 1: flat at 100 with one spike to 110 and one dip to 90.
    for k in 0..12i64 {
        let at = ts(2, 9, 15) + Duration::minutes(5 * k);
        let (high, low) = match k {
            4 => (110.0, 99.0),
            7 => (101.0, 90.0),
            _ => (101.0, 99.0),
        };
        out.push(candle(at, 100.0, high, low, 100.0));
    }

    // Day 2: flat at 105 from 09:15 to 09:55.
    let t = |k: i64| ts(3, 9, 15) + Duration::minutes(5 * k);
    for k in 0..9 {
        out.push(candle(t(k), 105.0, 106.0, 104.0, 105.0));
    }
    out.extend([
        // 10:00 breakout, 10:05 confirmation.
        candle(t(9), 105.0, 113.0, 104.0, 112.0),
        candle(t(10), 112.0, 116.0, 111.0, 115.0),
        // 10:10 entry at 115.
        candle(t(11), 115.0, 118.0, 114.0, 117.0),
        // 10:15 Lot 1 target 125.
        candle(t(12), 117.0, 126.0, 116.0, 119.0),
        // 10:20 runner trails to 116.
        candle(t(13), 119.0, 119.5, 117.0, 118.0),
        // 10:25 runner trails to 117 and is hit.
        candle(t(14), 118.0, 118.5, 112.0, 113.0),
    ]);
    for k in 15..20 {
        out.push(candle(t(k), 113.0, 114.0, 112.0, 113.0));
    }
    out
}

/// Fixture plus a third session (2024-01-04) of quiet candles.
pub fn fixture_with_third_day() -> Vec<Candle> {
    let mut out = fixture_candles();
    for k in 0..6i64 {
        let at = ts(4, 9, 15) + Duration::minutes(5 * k);
        out.push(candle(at, 113.0, 114.0, 112.0, 113.0));
    }
    out
}

/// The two fixture sessions with the breakout session moved to 2024-01-04,
/// leaving 2024-01-03 as a market holiday.
pub fn fixture_across_holiday() -> Vec<Candle> {
    let breakout_day = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
    let clock = SessionClock::default();
    fixture_candles()
        .into_iter()
        .map(|mut c| {
            if clock.trading_date(&c.timestamp) == breakout_day {
                c.timestamp += Duration::days(1);
            }
            c
        })
        .collect()
}

/// `fixture_across_holiday` with a quiet session on 2024-01-03 between the
/// pivot day and the breakout day.
pub fn fixture_with_middle_day() -> Vec<Candle> {
    let mut out = fixture_across_holiday();
    let middle: Vec<Candle> = (0..6i64)
        .map(|k| {
            let at = ts(3, 9, 15) + Duration::minutes(5 * k);
            candle(at, 105.0, 106.0, 104.0, 105.0)
        })
        .collect();
    out.extend(middle);
    out.sort_by_key(|c| c.timestamp);
    out
}
