//! Backtest runner — wires together enrichment, signals, simulation and metrics.
//!
//! Entry points:
//! - `detect_signals()`: enrich and scan only. Used by the `signals` command.
//! - `run_backtest()`: full scale-out pipeline over a candle slice.
//! - `run_backtest_from_data()`: same, carrying the loader's provenance.
//! - `run_single_exit()`: the one-lot pipeline.
//!
//! Signals are simulated in parallel with rayon. Each simulation is a pure
//! function of (signal, candles), so rows come back in signal order and
//! match a sequential replay exactly.

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use pivotlab_core::enrich::validate_candles;
use pivotlab_core::signals::ScanStats;
use pivotlab_core::{
    enrich, simulate_scaleout, simulate_single_exit, Candle, CandleError, EnrichedCandle,
    ScaleOutConfig, SessionClock, Signal, SignalEngine, SimulationError, SingleExitResult,
    TradeResult,
};

use crate::config::{BacktestConfig, ConfigError, InvalidDayPolicy, RunId};
use crate::costs::TradePnl;
use crate::data_loader::{dataset_hash, LoadError, LoadedCandles};
use crate::metrics::{ScaleOutSummary, SingleExitSummary};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Load(#[from] LoadError),
    #[error("invalid candle data: {0}")]
    Candles(#[from] CandleError),
    #[error("simulation error: {0}")]
    Simulation(#[from] SimulationError),
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Default schema version for serde deserialization of older JSON without the field.
fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// One simulated signal with its risk and cost columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRow {
    pub signal: Signal,
    pub result: TradeResult,
    /// `|entry - stop|`.
    pub risk_points: f64,
    /// Lot 1 target distance over risk.
    pub tp1_rr: Option<f64>,
    /// `None` for NO_DATA rows.
    pub pnl: Option<TradePnl>,
}

/// One signal replayed through the single-exit simulator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingleExitRow {
    pub signal: Signal,
    pub result: SingleExitResult,
    pub risk_points: f64,
    pub rr: Option<f64>,
    pub net_pnl: Option<f64>,
}

/// Candles that survived validation, their enrichment, and what was dropped.
#[derive(Debug, Clone)]
pub struct PreparedCandles {
    pub candles: Vec<Candle>,
    pub enriched: Vec<EnrichedCandle>,
    pub excluded_days: Vec<NaiveDate>,
    pub data_quality_warnings: Vec<String>,
}

/// Output of the signal stage alone.
#[derive(Debug, Clone)]
pub struct SignalScan {
    pub prepared: PreparedCandles,
    /// Signals that passed the configured post-filters.
    pub signals: Vec<Signal>,
    /// Signals the post-filters removed.
    pub filtered_out: usize,
    pub stats: ScanStats,
}

/// Complete result of a scale-out backtest run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: RunId,
    pub dataset_hash: String,
    pub has_synthetic: bool,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub candle_count: usize,
    pub signal_count: usize,
    pub filtered_out: usize,
    pub trades: Vec<TradeRow>,
    pub summary: ScaleOutSummary,
    #[serde(default)]
    pub excluded_days: Vec<NaiveDate>,
    #[serde(default)]
    pub data_quality_warnings: Vec<String>,
    pub config: BacktestConfig,
}

/// Complete result of a single-exit backtest run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SingleExitRun {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: RunId,
    pub dataset_hash: String,
    pub has_synthetic: bool,
    pub candle_count: usize,
    pub signal_count: usize,
    pub filtered_out: usize,
    pub trades: Vec<SingleExitRow>,
    pub summary: SingleExitSummary,
    #[serde(default)]
    pub excluded_days: Vec<NaiveDate>,
    #[serde(default)]
    pub data_quality_warnings: Vec<String>,
    pub config: BacktestConfig,
}

fn short_id(run_id: &str) -> &str {
    run_id.get(..12).unwrap_or(run_id)
}

/// Validate and enrich, applying the configured invalid-day policy.
pub fn prepare_candles(
    candles: &[Candle],
    config: &BacktestConfig,
    clock: &SessionClock,
) -> Result<PreparedCandles, RunError> {
    let indicators = config.indicator_config();
    let mut kept = candles.to_vec();
    let mut excluded_days = Vec::new();
    let mut data_quality_warnings = Vec::new();

    if config.data.invalid_day_policy == InvalidDayPolicy::ExcludeDay {
        // Each pass removes the day holding the offending candle, so this
        // terminates.
        while let Err(err) = validate_candles(&kept) {
            let day = clock.trading_date(&err.timestamp());
            warn!(%day, error = %err, "excluding trading day with invalid candles");
            data_quality_warnings.push(format!("excluded {day}: {err}"));
            excluded_days.push(day);
            kept.retain(|c| clock.trading_date(&c.timestamp) != day);
        }
    }

    let mut enriched = enrich(&kept, clock, &indicators)?;
    mask_pivots_after_excluded(&mut enriched, &excluded_days);
    Ok(PreparedCandles {
        candles: kept,
        enriched,
        excluded_days,
        data_quality_warnings,
    })
}

/// Clear pivots on any day whose previous-day aggregate was excluded.
///
/// A date keeps its pivots only when no excluded date lies between it and the
/// previous date still present. Ordinary gaps (weekends, holidays) are
/// untouched.
fn mask_pivots_after_excluded(enriched: &mut [EnrichedCandle], excluded_days: &[NaiveDate]) {
    if excluded_days.is_empty() {
        return;
    }
    let mut prev_date: Option<NaiveDate> = None;
    let mut current: Option<(NaiveDate, bool)> = None;
    for e in enriched.iter_mut() {
        let orphaned = match current {
            Some((date, orphaned)) if date == e.trading_date => orphaned,
            _ => {
                if let Some((date, _)) = current {
                    prev_date = Some(date);
                }
                let orphaned = excluded_days
                    .iter()
                    .any(|&x| x < e.trading_date && prev_date.map_or(true, |p| x > p));
                if orphaned && e.pivots.is_some() {
                    warn!(day = %e.trading_date, "previous session excluded; pivots cleared");
                }
                current = Some((e.trading_date, orphaned));
                orphaned
            }
        };
        if orphaned {
            e.pivots = None;
        }
    }
}

/// Enrich, scan and post-filter.
pub fn detect_signals(candles: &[Candle], config: &BacktestConfig) -> Result<SignalScan, RunError> {
    config.validate()?;
    let clock = config.clock()?;
    let prepared = prepare_candles(candles, config, &clock)?;
    let signal_config = config.signal_config()?;
    let (all, stats) = SignalEngine::new(&prepared.enriched, &signal_config, &clock).run();
    debug!(
        windows = stats.windows,
        skipped_no_pivots = stats.skipped_no_pivots,
        skipped_time = stats.skipped_time,
        skipped_cross_day = stats.skipped_cross_day,
        rejected_risk = stats.rejected_risk,
        emitted = stats.emitted,
        "signal scan complete"
    );

    let filter = config.trade_filter()?;
    let total = all.len();
    let signals: Vec<Signal> = all
        .into_iter()
        .filter(|s| filter.allows(s, &clock))
        .collect();
    let filtered_out = total - signals.len();
    if filtered_out > 0 {
        debug!(filtered_out, kept = signals.len(), "post-filters applied");
    }

    Ok(SignalScan {
        prepared,
        signals,
        filtered_out,
        stats,
    })
}

/// Simulate every signal through the scale-out policy, in parallel.
///
/// Output order matches `signals`.
pub fn simulate_signals(
    signals: &[Signal],
    candles: &[Candle],
    config: &ScaleOutConfig,
    clock: &SessionClock,
) -> Result<Vec<TradeResult>, SimulationError> {
    signals
        .par_iter()
        .map(|s| simulate_scaleout(s, candles, config, clock))
        .collect()
}

/// Run the full scale-out backtest over a candle slice.
pub fn run_backtest(
    candles: &[Candle],
    config: &BacktestConfig,
) -> Result<BacktestResult, RunError> {
    let data = LoadedCandles {
        candles: candles.to_vec(),
        dataset_hash: dataset_hash(candles),
        has_synthetic: false,
        duplicates_dropped: 0,
    };
    run_backtest_from_data(&data, config)
}

/// Run the full scale-out backtest over loaded candles.
pub fn run_backtest_from_data(
    data: &LoadedCandles,
    config: &BacktestConfig,
) -> Result<BacktestResult, RunError> {
    let run_id = config.run_id();
    info!(
        run_id = %short_id(&run_id),
        candles = data.candles.len(),
        synthetic = data.has_synthetic,
        "starting scale-out backtest"
    );

    let scan = detect_signals(&data.candles, config)?;
    let clock = config.clock()?;
    let scaleout = config.scaleout_config();
    let results = simulate_signals(&scan.signals, &scan.prepared.candles, &scaleout, &clock)?;

    let trades: Vec<TradeRow> = scan
        .signals
        .iter()
        .zip(results)
        .map(|(signal, result)| TradeRow {
            risk_points: signal.risk_points(),
            tp1_rr: signal.reward_risk(scaleout.target1_points),
            pnl: config.costs.trade_pnl(&result),
            signal: signal.clone(),
            result,
        })
        .collect();

    let summary = ScaleOutSummary::compute(&trades);
    if summary.no_data > 0 {
        warn!(no_data = summary.no_data, "signals with no candles to scan");
    }
    info!(
        signals = scan.signals.len(),
        trades = summary.trades,
        net_points = summary.net_points,
        net_pnl = summary.net_pnl,
        "backtest complete"
    );

    let mut warnings = scan.prepared.data_quality_warnings.clone();
    if data.duplicates_dropped > 0 {
        warnings.push(format!(
            "{} duplicate timestamps dropped on load",
            data.duplicates_dropped
        ));
    }

    Ok(BacktestResult {
        schema_version: SCHEMA_VERSION,
        run_id,
        dataset_hash: data.dataset_hash.clone(),
        has_synthetic: data.has_synthetic,
        start_date: scan.prepared.enriched.first().map(|c| c.trading_date),
        end_date: scan.prepared.enriched.last().map(|c| c.trading_date),
        candle_count: scan.prepared.candles.len(),
        signal_count: scan.signals.len() + scan.filtered_out,
        filtered_out: scan.filtered_out,
        trades,
        summary,
        excluded_days: scan.prepared.excluded_days,
        data_quality_warnings: warnings,
        config: config.clone(),
    })
}

/// Run the single-exit backtest over loaded candles.
pub fn run_single_exit(
    data: &LoadedCandles,
    config: &BacktestConfig,
) -> Result<SingleExitRun, RunError> {
    let run_id = config.run_id();
    info!(run_id = %short_id(&run_id), candles = data.candles.len(), "starting single-exit backtest");

    let scan = detect_signals(&data.candles, config)?;
    let clock = config.clock()?;
    let target = config.signal_config()?.target_points;
    let candles = &scan.prepared.candles;
    let results: Vec<SingleExitResult> = scan
        .signals
        .par_iter()
        .map(|s| simulate_single_exit(s, candles, &clock))
        .collect::<Result<_, _>>()?;

    let trades: Vec<SingleExitRow> = scan
        .signals
        .iter()
        .zip(results)
        .map(|(signal, result)| SingleExitRow {
            risk_points: signal.risk_points(),
            rr: signal.reward_risk(target),
            net_pnl: config.costs.single_lot_net(result.pnl_points),
            signal: signal.clone(),
            result,
        })
        .collect();
    let summary = SingleExitSummary::compute(&trades);
    info!(trades = summary.trades, net_points = summary.net_points, "backtest complete");

    Ok(SingleExitRun {
        schema_version: SCHEMA_VERSION,
        run_id,
        dataset_hash: data.dataset_hash.clone(),
        has_synthetic: data.has_synthetic,
        candle_count: candles.len(),
        signal_count: scan.signals.len() + scan.filtered_out,
        filtered_out: scan.filtered_out,
        trades,
        summary,
        excluded_days: scan.prepared.excluded_days.clone(),
        data_quality_warnings: scan.prepared.data_quality_warnings.clone(),
        config: config.clone(),
    })
}
