//! PivotLab Core — intraday pivot breakout signals and scale-out trade simulation.
//!
//! This crate contains the two engines of the backtester:
//! - Candle domain types and the trading-session calendar
//! - Indicators (EMA, intraday VWAP, previous-day pivots) and enrichment
//! - Signal engine: 3-candle breakout + confirmation + trend filter scan
//! - Scale-out simulator: two-lot resolution with break-even and trailing stop
//! - Single-exit simulator: one-lot target/stop resolution
//!
//! Everything here is synchronous and pure. Callers own the candle data and
//! pass tunables explicitly; there is no global state.

pub mod domain;
pub mod enrich;
pub mod indicators;
pub mod session;
pub mod signals;
pub mod simulator;

pub use domain::{
    Candle, ExitReason, LotOutcome, PivotLevel, Side, Signal, SingleExitReason,
    SingleExitResult, TradeResult,
};
pub use enrich::{enrich, CandleError, EnrichedCandle, IndicatorConfig};
pub use session::{SessionClock, SessionError};
pub use signals::{generate_signals, SignalConfig, SignalEngine};
pub use simulator::{
    simulate_scaleout, simulate_single_exit, ScaleOutConfig, ScaleOutTrade, SimulationError,
};
