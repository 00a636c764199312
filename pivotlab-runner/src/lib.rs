//! PivotLab Runner — backtest orchestration, costs, metrics and reports.
//!
//! This crate builds on `pivotlab-core` to provide:
//! - TOML configuration with defaults and validation
//! - CSV candle loading, canonicalization and a synthetic generator
//! - Batch simulation of every signal (rayon) with an invalid-day policy
//! - Per-lot cost model and summary metrics
//! - Grouped breakdowns and filter-variant comparison
//! - JSON / CSV / Markdown artifacts

pub mod breakdown;
pub mod config;
pub mod costs;
pub mod data_loader;
pub mod export;
pub mod metrics;
pub mod runner;
pub mod variants;

pub use breakdown::{Breakdowns, GroupStats, PnlBasis};
pub use config::{BacktestConfig, ConfigError, InvalidDayPolicy};
pub use costs::{CostModel, LotPnl, TradePnl};
pub use data_loader::{load_candles_csv, LoadError, LoadedCandles};
pub use metrics::{ScaleOutSummary, SingleExitSummary};
pub use runner::{
    detect_signals, run_backtest, run_backtest_from_data, run_single_exit, BacktestResult,
    RunError, SingleExitRun, TradeRow,
};
pub use variants::{compare_variants, standard_variants, TradeFilter, Variant, VariantResult};
