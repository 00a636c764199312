//! Domain types: candles, signals, trade results.

pub mod candle;
pub mod signal;
pub mod trade;

pub use candle::Candle;
pub use signal::{PivotLevel, Side, Signal};
pub use trade::{ExitReason, LotOutcome, SingleExitReason, SingleExitResult, TradeResult};
