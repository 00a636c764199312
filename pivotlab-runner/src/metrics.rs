//! Performance metrics — pure functions over per-trade PnL values.
//!
//! Trades that never entered (`NO_DATA`) carry no PnL and are excluded
//! before any statistic is computed. A trade is a win when its PnL is
//! strictly positive; everything else, including flat trades, is a loss.

use serde::{Deserialize, Serialize};

use crate::runner::{SingleExitRow, TradeRow};

/// Aggregate statistics for a scale-out run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaleOutSummary {
    /// Trades with an outcome (NO_DATA excluded).
    pub trades: usize,
    pub no_data: usize,
    pub wins: usize,
    pub losses: usize,
    /// Fraction of trades with positive combined points.
    pub win_rate: f64,
    pub tp1_hits: usize,
    pub tp1_rate: f64,
    /// Sum of combined (two-lot) points.
    pub net_points: f64,
    pub avg_points_per_trade: f64,
    /// `net_points / (2 * trades)`.
    pub effective_points_per_lot: f64,
    pub net_pnl: f64,
    pub gross_pnl: f64,
    /// Gross profit / gross loss in points. `None` without losing trades.
    pub profit_factor: Option<f64>,
    pub avg_mfe: f64,
    pub avg_mae: f64,
}

impl ScaleOutSummary {
    pub fn compute(rows: &[TradeRow]) -> Self {
        let traded: Vec<&TradeRow> = rows.iter().filter(|r| !r.result.is_no_data()).collect();
        let points: Vec<f64> = traded
            .iter()
            .filter_map(|r| r.result.total_points)
            .collect();
        let trades = points.len();
        let wins = count_wins(&points);
        let tp1_hits = traded.iter().filter(|r| r.result.hit_tp1()).count();
        let net_points: f64 = points.iter().sum();
        let mfe: Vec<f64> = traded.iter().filter_map(|r| r.result.mfe_points).collect();
        let mae: Vec<f64> = traded.iter().filter_map(|r| r.result.mae_points).collect();

        Self {
            trades,
            no_data: rows.len() - traded.len(),
            wins,
            losses: trades - wins,
            win_rate: win_rate(&points),
            tp1_hits,
            tp1_rate: ratio(tp1_hits, trades),
            net_points,
            avg_points_per_trade: mean(&points).unwrap_or(0.0),
            effective_points_per_lot: if trades == 0 {
                0.0
            } else {
                net_points / (2 * trades) as f64
            },
            net_pnl: traded.iter().filter_map(|r| r.pnl).map(|p| p.net_total).sum(),
            gross_pnl: traded.iter().filter_map(|r| r.pnl).map(|p| p.gross_total).sum(),
            profit_factor: profit_factor(&points),
            avg_mfe: mean(&mfe).unwrap_or(0.0),
            avg_mae: mean(&mae).unwrap_or(0.0),
        }
    }
}

/// Aggregate statistics for a single-exit run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingleExitSummary {
    pub trades: usize,
    pub no_data: usize,
    pub wins: usize,
    pub losses: usize,
    pub win_rate: f64,
    pub net_points: f64,
    pub avg_points_per_trade: f64,
    pub net_pnl: f64,
    pub profit_factor: Option<f64>,
}

impl SingleExitSummary {
    pub fn compute(rows: &[SingleExitRow]) -> Self {
        let points: Vec<f64> = rows.iter().filter_map(|r| r.result.pnl_points).collect();
        let trades = points.len();
        let wins = count_wins(&points);
        Self {
            trades,
            no_data: rows.len() - trades,
            wins,
            losses: trades - wins,
            win_rate: win_rate(&points),
            net_points: points.iter().sum(),
            avg_points_per_trade: mean(&points).unwrap_or(0.0),
            net_pnl: rows.iter().filter_map(|r| r.net_pnl).sum(),
            profit_factor: profit_factor(&points),
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

fn ratio(n: usize, d: usize) -> f64 {
    if d == 0 {
        0.0
    } else {
        n as f64 / d as f64
    }
}

pub fn count_wins(pnl: &[f64]) -> usize {
    pnl.iter().filter(|&&p| p > 0.0).count()
}

/// Fraction of strictly positive values. 0.0 when empty.
pub fn win_rate(pnl: &[f64]) -> f64 {
    ratio(count_wins(pnl), pnl.len())
}

/// Gross profit / gross loss.
///
/// `None` when there are no losing values (the ratio is undefined).
pub fn profit_factor(pnl: &[f64]) -> Option<f64> {
    let gross_profit: f64 = pnl.iter().filter(|&&p| p > 0.0).sum();
    let gross_loss: f64 = pnl.iter().filter(|&&p| p < 0.0).map(|p| p.abs()).sum();
    if gross_loss < 1e-10 {
        return None;
    }
    Some(gross_profit / gross_loss)
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Median; the mean of the two middle values for even lengths.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}
