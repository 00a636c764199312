//! Signal engine — pivot breakout with next-candle confirmation.
//!
//! Scans the enriched sequence with a 3-candle window (signal `i`,
//! confirmation `i+1`, entry `i+2`). A window may emit one signal per
//! qualifying level. Signals depend only on candle data and indicators,
//! never on simulated trades, and the scan is deterministic.
//!
//! Emission order: ascending signal index, then R1, R2, S1, S2.

pub mod breakout;

pub use breakout::{check_breakout, BreakoutCheck};

use chrono::NaiveTime;
use tracing::{debug, warn};

use crate::domain::{PivotLevel, Side, Signal};
use crate::enrich::EnrichedCandle;
use crate::session::SessionClock;

/// Tunables for signal detection.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalConfig {
    /// Target distance in points from entry.
    pub target_points: f64,
    /// Earliest session time for the breakout candle (inclusive).
    pub signal_start: NaiveTime,
    /// Latest session time for the entry candle (inclusive).
    pub entry_cutoff: NaiveTime,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            target_points: 40.0,
            signal_start: NaiveTime::from_hms_opt(9, 30, 0).expect("valid time literal"),
            entry_cutoff: NaiveTime::from_hms_opt(14, 45, 0).expect("valid time literal"),
        }
    }
}

/// Per-run scan counters, logged at debug level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub windows: usize,
    pub skipped_no_pivots: usize,
    pub skipped_time: usize,
    pub skipped_cross_day: usize,
    pub rejected_risk: usize,
    pub emitted: usize,
}

/// Stateless scanner over one enriched sequence.
pub struct SignalEngine<'a> {
    candles: &'a [EnrichedCandle],
    config: &'a SignalConfig,
    clock: &'a SessionClock,
}

impl<'a> SignalEngine<'a> {
    pub fn new(
        candles: &'a [EnrichedCandle],
        config: &'a SignalConfig,
        clock: &'a SessionClock,
    ) -> Self {
        Self {
            candles,
            config,
            clock,
        }
    }

    /// Evaluate the window whose breakout candle is `i`.
    ///
    /// Returns no signals if `i` is out of the scannable range `1..len-2`.
    pub fn evaluate_window(&self, i: usize) -> Vec<Signal> {
        let mut stats = ScanStats::default();
        self.evaluate_into(i, &mut stats)
    }

    /// Scan every window and return signals in emission order.
    pub fn run(&self) -> (Vec<Signal>, ScanStats) {
        let mut stats = ScanStats::default();
        let mut signals = Vec::new();
        for i in 1..self.candles.len().saturating_sub(2) {
            stats.windows += 1;
            signals.extend(self.evaluate_into(i, &mut stats));
        }
        stats.emitted = signals.len();
        (signals, stats)
    }

    fn evaluate_into(&self, i: usize, stats: &mut ScanStats) -> Vec<Signal> {
        let mut out = Vec::new();
        if i == 0 || i + 2 >= self.candles.len() {
            return out;
        }
        let sig = &self.candles[i];
        let confirm = &self.candles[i + 1];
        let entry = &self.candles[i + 2];

        let Some(pivots) = sig.pivots else {
            stats.skipped_no_pivots += 1;
            return out;
        };

        let sig_tod = self.clock.time_of_day(&sig.candle.timestamp);
        let entry_tod = self.clock.time_of_day(&entry.candle.timestamp);
        if sig_tod < self.config.signal_start || entry_tod > self.config.entry_cutoff {
            stats.skipped_time += 1;
            return out;
        }

        if sig.trading_date != confirm.trading_date || sig.trading_date != entry.trading_date {
            stats.skipped_cross_day += 1;
            return out;
        }

        let prev = &self.candles[i - 1];
        let levels = PivotLevel::LONG_LEVELS
            .iter()
            .map(|&l| (Side::Long, l))
            .chain(PivotLevel::SHORT_LEVELS.iter().map(|&l| (Side::Short, l)));

        for (side, level) in levels {
            let level_value = level.value(&pivots);
            if check_breakout(side, level_value, prev, sig, confirm) != BreakoutCheck::Pass {
                continue;
            }

            let fut_entry = entry.candle.open;
            let (fut_sl, fut_tp) = match side {
                Side::Long => (sig.candle.low, fut_entry + self.config.target_points),
                Side::Short => (sig.candle.high, fut_entry - self.config.target_points),
            };
            let signal = Signal {
                side,
                level,
                level_value,
                signal_time: sig.candle.timestamp,
                entry_time: entry.candle.timestamp,
                signal_close: sig.candle.close,
                fut_entry,
                fut_sl,
                fut_tp,
                signal_idx: i,
                confirm_idx: i + 1,
                entry_idx: i + 2,
            };

            if !signal.has_valid_risk() {
                stats.rejected_risk += 1;
                warn!(
                    side = %side,
                    level = %level,
                    signal_time = %signal.signal_time,
                    entry = fut_entry,
                    stop = fut_sl,
                    "rejected breakout with stop on the wrong side of entry"
                );
                continue;
            }
            out.push(signal);
        }
        out
    }
}

/// Generate all signals for an enriched sequence.
pub fn generate_signals(
    candles: &[EnrichedCandle],
    config: &SignalConfig,
    clock: &SessionClock,
) -> Vec<Signal> {
    let (signals, stats) = SignalEngine::new(candles, config, clock).run();
    debug!(
        windows = stats.windows,
        skipped_no_pivots = stats.skipped_no_pivots,
        skipped_time = stats.skipped_time,
        skipped_cross_day = stats.skipped_cross_day,
        rejected_risk = stats.rejected_risk,
        emitted = stats.emitted,
        "signal scan complete"
    );
    signals
}
