//! Integration tests for the signal engine.
//!
//! Scenarios are built directly on enriched candles so pivots, VWAP and EMAs
//! are fixed by hand. Prior day H=110 L=90 C=100 gives
//! P=100, R1=110, R2=120, S1=90, S2=80.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};
use pivotlab_core::indicators::PivotLevels;
use pivotlab_core::{
    enrich, generate_signals, Candle, EnrichedCandle, IndicatorConfig, PivotLevel,
    SessionClock, Side, SignalConfig, SignalEngine,
};

// ──────────────────────────────────────────────
// Helpers
// ──────────────────────────────────────────────

fn clock() -> SessionClock {
    SessionClock::default()
}

fn ts(day: u32, h: u32, m: u32) -> DateTime<FixedOffset> {
    clock()
        .at(
            NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            NaiveTime::from_hms_opt(h, m, 0).unwrap(),
        )
        .unwrap()
}

fn pivots() -> PivotLevels {
    PivotLevels::from_prior_day(110.0, 90.0, 100.0)
}

/// Enriched candle with bullish trend context (vwap 105, fast 106, slow 100).
fn bull(at: DateTime<FixedOffset>, o: f64, h: f64, l: f64, c: f64) -> EnrichedCandle {
    EnrichedCandle {
        candle: Candle {
            timestamp: at,
            open: o,
            high: h,
            low: l,
            close: c,
            volume: 1000.0,
        },
        trading_date: clock().trading_date(&at),
        ema_fast: Some(106.0),
        ema_slow: Some(100.0),
        vwap: Some(105.0),
        pivots: Some(pivots()),
    }
}

/// Enriched candle with bearish trend context (vwap 95, fast 94, slow 100).
fn bear(at: DateTime<FixedOffset>, o: f64, h: f64, l: f64, c: f64) -> EnrichedCandle {
    let mut e = bull(at, o, h, l, c);
    e.ema_fast = Some(94.0);
    e.ema_slow = Some(100.0);
    e.vwap = Some(95.0);
    e
}

/// R1 breakout at index 1, confirmation at 2, entry at 3.
fn r1_breakout(start_h: u32, start_m: u32) -> Vec<EnrichedCandle> {
    let t = |k: i64| ts(3, start_h, start_m) + chrono::Duration::minutes(5 * k);
    vec![
        bull(t(0), 105.0, 109.0, 104.0, 108.0),
        bull(t(1), 108.0, 113.0, 107.0, 112.0),
        bull(t(2), 112.0, 116.0, 111.0, 115.0),
        bull(t(3), 115.0, 118.0, 114.0, 117.0),
        bull(t(4), 117.0, 119.0, 116.0, 118.0),
    ]
}

// ──────────────────────────────────────────────
// Detection
// ──────────────────────────────────────────────

#[test]
fn single_window_emits_one_signal() {
    let candles = r1_breakout(10, 0);
    let signals = generate_signals(&candles, &SignalConfig::default(), &clock());
    assert_eq!(signals.len(), 1);

    let s = &signals[0];
    assert_eq!(s.side, Side::Long);
    assert_eq!(s.level, PivotLevel::R1);
    assert_eq!(s.level_value, 110.0);
    assert_eq!(s.fut_entry, candles[3].candle.open);
    assert_eq!(s.fut_sl, candles[1].candle.low);
    assert_eq!(s.fut_tp, 155.0);
    assert_eq!(s.signal_close, 112.0);
    assert_eq!((s.signal_idx, s.confirm_idx, s.entry_idx), (1, 2, 3));
    assert_eq!(s.signal_time, candles[1].candle.timestamp);
    assert_eq!(s.entry_time, candles[3].candle.timestamp);
}

#[test]
fn one_window_can_break_two_levels() {
    let t = |k: i64| ts(3, 10, 0) + chrono::Duration::minutes(5 * k);
    let candles = vec![
        bull(t(0), 105.0, 109.0, 104.0, 108.0),
        bull(t(1), 108.0, 123.0, 107.0, 122.0),
        bull(t(2), 122.0, 126.0, 121.0, 125.0),
        bull(t(3), 125.0, 128.0, 124.0, 127.0),
    ];
    let signals = generate_signals(&candles, &SignalConfig::default(), &clock());
    let levels: Vec<PivotLevel> = signals.iter().map(|s| s.level).collect();
    assert_eq!(levels, vec![PivotLevel::R1, PivotLevel::R2]);
    assert!(signals.iter().all(|s| s.fut_sl == 107.0 && s.fut_entry == 125.0));
}

#[test]
fn short_breakout_mirrors_long() {
    let t = |k: i64| ts(3, 11, 0) + chrono::Duration::minutes(5 * k);
    let candles = vec![
        bear(t(0), 93.0, 94.0, 91.0, 92.0),
        bear(t(1), 92.0, 93.0, 88.0, 89.0),
        bear(t(2), 89.0, 89.5, 86.0, 87.0),
        bear(t(3), 87.0, 88.0, 85.0, 86.0),
    ];
    let signals = generate_signals(&candles, &SignalConfig::default(), &clock());
    assert_eq!(signals.len(), 1);
    let s = &signals[0];
    assert_eq!(s.side, Side::Short);
    assert_eq!(s.level, PivotLevel::S1);
    assert_eq!(s.fut_entry, 87.0);
    assert_eq!(s.fut_sl, 93.0);
    assert_eq!(s.fut_tp, 47.0);
}

#[test]
fn custom_target_distance() {
    let candles = r1_breakout(10, 0);
    let config = SignalConfig {
        target_points: 25.0,
        ..SignalConfig::default()
    };
    let signals = generate_signals(&candles, &config, &clock());
    assert_eq!(signals[0].fut_tp, 140.0);
}

// ──────────────────────────────────────────────
// Skips and rejections
// ──────────────────────────────────────────────

#[test]
fn signal_candle_before_start_is_skipped() {
    // Breakout candle at 09:25.
    let candles = r1_breakout(9, 20);
    assert!(generate_signals(&candles, &SignalConfig::default(), &clock()).is_empty());
}

#[test]
fn signal_candle_at_start_is_inclusive() {
    // Breakout candle at 09:30.
    let candles = r1_breakout(9, 25);
    assert_eq!(
        generate_signals(&candles, &SignalConfig::default(), &clock()).len(),
        1
    );
}

#[test]
fn entry_at_cutoff_is_inclusive() {
    // Entry candle at 14:45.
    let candles = r1_breakout(14, 30);
    assert_eq!(
        generate_signals(&candles, &SignalConfig::default(), &clock()).len(),
        1
    );
}

#[test]
fn entry_after_cutoff_is_skipped() {
    // Entry candle at 14:50.
    let candles = r1_breakout(14, 35);
    assert!(generate_signals(&candles, &SignalConfig::default(), &clock()).is_empty());
}

#[test]
fn narrower_cutoff_is_a_parameter() {
    let candles = r1_breakout(13, 50);
    let config = SignalConfig {
        entry_cutoff: NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
        ..SignalConfig::default()
    };
    // Entry at 14:05.
    assert!(generate_signals(&candles, &config, &clock()).is_empty());
}

#[test]
fn cross_day_window_is_skipped() {
    let mut candles = r1_breakout(10, 0);
    let next_day = ts(4, 9, 15);
    candles[3].candle.timestamp = next_day;
    candles[3].trading_date = clock().trading_date(&next_day);
    candles[4].candle.timestamp = next_day + chrono::Duration::minutes(5);
    candles[4].trading_date = candles[3].trading_date;
    assert!(generate_signals(&candles, &SignalConfig::default(), &clock()).is_empty());
}

#[test]
fn missing_pivots_skip_window() {
    let mut candles = r1_breakout(10, 0);
    candles[1].pivots = None;
    assert!(generate_signals(&candles, &SignalConfig::default(), &clock()).is_empty());
}

#[test]
fn missing_trend_indicator_skips_level() {
    let mut candles = r1_breakout(10, 0);
    candles[1].ema_slow = None;
    assert!(generate_signals(&candles, &SignalConfig::default(), &clock()).is_empty());
}

#[test]
fn gap_below_stop_is_rejected() {
    let mut candles = r1_breakout(10, 0);
    // Entry opens at 106, below the breakout candle's low of 107.
    candles[3].candle.open = 106.0;
    candles[3].candle.low = 105.0;
    assert!(generate_signals(&candles, &SignalConfig::default(), &clock()).is_empty());
}

#[test]
fn window_zero_and_tail_are_out_of_range() {
    let candles = r1_breakout(10, 0);
    let config = SignalConfig::default();
    let clock = clock();
    let engine = SignalEngine::new(&candles, &config, &clock);
    assert!(engine.evaluate_window(0).is_empty());
    assert!(engine.evaluate_window(3).is_empty());
    assert_eq!(engine.evaluate_window(1).len(), 1);
}

#[test]
fn scan_stats_count_skips() {
    let mut candles = r1_breakout(10, 0);
    candles[2].pivots = None;
    let config = SignalConfig::default();
    let clock = clock();
    let (signals, stats) = SignalEngine::new(&candles, &config, &clock).run();
    assert_eq!(signals.len(), 1);
    assert_eq!(stats.windows, 2);
    assert_eq!(stats.skipped_no_pivots, 1);
    assert_eq!(stats.emitted, 1);
}

#[test]
fn signals_ordered_by_index() {
    let mut candles = r1_breakout(10, 0);
    let t = |k: i64| ts(3, 12, 0) + chrono::Duration::minutes(5 * k);
    // Second setup later the same day: dip back under R1, then break again.
    candles.extend(vec![
        bull(t(0), 112.0, 112.5, 108.0, 109.0),
        bull(t(1), 109.0, 114.0, 108.5, 113.0),
        bull(t(2), 113.0, 116.0, 111.0, 115.0),
        bull(t(3), 115.0, 117.0, 114.0, 116.0),
    ]);
    let signals = generate_signals(&candles, &SignalConfig::default(), &clock());
    let idx: Vec<usize> = signals.iter().map(|s| s.signal_idx).collect();
    assert_eq!(idx, vec![1, 6]);
}

// ──────────────────────────────────────────────
// Through enrichment
// ──────────────────────────────────────────────

#[test]
fn enriched_sequence_first_day_never_signals() {
    let mut raw = Vec::new();
    let mut price = 100.0;
    for day in [2u32, 3] {
        for k in 0..75i64 {
            let at = ts(day, 9, 15) + chrono::Duration::minutes(5 * k);
            let open = price;
            price += if k % 7 == 3 { -0.8 } else { 0.6 };
            raw.push(Candle {
                timestamp: at,
                open,
                high: open.max(price) + 0.5,
                low: open.min(price) - 0.5,
                close: price,
                volume: 1000.0,
            });
        }
    }
    let config = IndicatorConfig {
        ema_fast: 5,
        ema_slow: 20,
        ema_min_periods: 0,
    };
    let enriched = enrich(&raw, &clock(), &config).unwrap();
    let signals = generate_signals(&enriched, &SignalConfig::default(), &clock());
    let day2 = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
    for s in &signals {
        assert_eq!(clock().trading_date(&s.signal_time), day2);
        assert_eq!(s.fut_entry, raw[s.entry_idx].open);
        match s.side {
            Side::Long => assert_eq!(s.fut_sl, raw[s.signal_idx].low),
            Side::Short => assert_eq!(s.fut_sl, raw[s.signal_idx].high),
        }
    }
}
