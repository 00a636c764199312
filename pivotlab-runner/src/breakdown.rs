//! Grouped trade statistics.
//!
//! Groups are formed by side, pivot level, side+level, entry time bucket
//! and exit pattern. Each group reports the same statistics so tables can
//! be compared row by row. Groups sort by net PnL, then trade count, both
//! descending.

use std::collections::BTreeMap;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use pivotlab_core::SessionClock;

use crate::metrics::{count_wins, mean, median, profit_factor, win_rate};
use crate::runner::TradeRow;

/// Which PnL a statistic aggregates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PnlBasis {
    /// Combined two-lot points.
    #[default]
    Points,
    /// Net currency after slippage and charges.
    NetCurrency,
}

impl PnlBasis {
    pub fn value(self, row: &TradeRow) -> Option<f64> {
        match self {
            PnlBasis::Points => row.result.total_points,
            PnlBasis::NetCurrency => row.pnl.map(|p| p.net_total),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupStats {
    pub key: String,
    pub trades: usize,
    pub wins: usize,
    pub losses: usize,
    pub win_rate: f64,
    pub net: f64,
    pub avg: Option<f64>,
    pub median: Option<f64>,
    pub avg_win: Option<f64>,
    pub avg_loss: Option<f64>,
    pub max_win: Option<f64>,
    pub max_loss: Option<f64>,
    pub profit_factor: Option<f64>,
}

/// Statistics over `rows`. Rows without a PnL on `basis` are skipped.
pub fn group_stats(key: impl Into<String>, rows: &[&TradeRow], basis: PnlBasis) -> GroupStats {
    let pnl: Vec<f64> = rows.iter().filter_map(|r| basis.value(r)).collect();
    let winners: Vec<f64> = pnl.iter().copied().filter(|&p| p > 0.0).collect();
    let losers: Vec<f64> = pnl.iter().copied().filter(|&p| p <= 0.0).collect();
    let wins = count_wins(&pnl);
    GroupStats {
        key: key.into(),
        trades: pnl.len(),
        wins,
        losses: pnl.len() - wins,
        win_rate: win_rate(&pnl),
        net: pnl.iter().sum(),
        avg: mean(&pnl),
        median: median(&pnl),
        avg_win: mean(&winners),
        avg_loss: mean(&losers),
        max_win: pnl.iter().copied().reduce(f64::max),
        max_loss: pnl.iter().copied().reduce(f64::min),
        profit_factor: profit_factor(&pnl),
    }
}

/// Entry time-of-day bucket label.
pub fn time_bucket(t: NaiveTime) -> &'static str {
    let hm = |h, m| NaiveTime::from_hms_opt(h, m, 0).expect("valid time literal");
    if t < hm(11, 0) {
        "09:15-11:00"
    } else if t < hm(13, 0) {
        "11:00-13:00"
    } else if t < hm(14, 30) {
        "13:00-14:30"
    } else {
        "14:30-15:30"
    }
}

/// Group `rows` by `key_fn` and compute stats per group, sorted.
pub fn breakdown_by<F>(rows: &[TradeRow], basis: PnlBasis, key_fn: F) -> Vec<GroupStats>
where
    F: Fn(&TradeRow) -> String,
{
    let mut groups: BTreeMap<String, Vec<&TradeRow>> = BTreeMap::new();
    for row in rows.iter().filter(|r| basis.value(r).is_some()) {
        groups.entry(key_fn(row)).or_default().push(row);
    }
    let mut stats: Vec<GroupStats> = groups
        .into_iter()
        .map(|(key, members)| group_stats(key, &members, basis))
        .collect();
    stats.sort_by(|a, b| {
        b.net
            .total_cmp(&a.net)
            .then_with(|| b.trades.cmp(&a.trades))
    });
    stats
}

/// All standard breakdown tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Breakdowns {
    pub basis: PnlBasis,
    pub by_side: Vec<GroupStats>,
    pub by_level: Vec<GroupStats>,
    pub by_side_level: Vec<GroupStats>,
    pub by_time_bucket: Vec<GroupStats>,
    pub by_exit_pattern: Vec<GroupStats>,
}

impl Breakdowns {
    pub fn compute(rows: &[TradeRow], basis: PnlBasis, clock: &SessionClock) -> Self {
        Self {
            basis,
            by_side: breakdown_by(rows, basis, |r| r.signal.side.to_string()),
            by_level: breakdown_by(rows, basis, |r| r.signal.level.to_string()),
            by_side_level: breakdown_by(rows, basis, |r| {
                format!("{} {}", r.signal.side, r.signal.level)
            }),
            by_time_bucket: breakdown_by(rows, basis, |r| {
                time_bucket(clock.time_of_day(&r.signal.entry_time)).to_string()
            }),
            by_exit_pattern: breakdown_by(rows, basis, |r| r.result.exit_pattern()),
        }
    }

    /// Tables paired with their titles, in display order.
    pub fn tables(&self) -> [(&'static str, &[GroupStats]); 5] {
        [
            ("Side", self.by_side.as_slice()),
            ("Level", self.by_level.as_slice()),
            ("Side + Level", self.by_side_level.as_slice()),
            ("Entry time", self.by_time_bucket.as_slice()),
            ("Exit pattern", self.by_exit_pattern.as_slice()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn bucket_edges() {
        assert_eq!(time_bucket(t(9, 20)), "09:15-11:00");
        assert_eq!(time_bucket(t(10, 55)), "09:15-11:00");
        assert_eq!(time_bucket(t(11, 0)), "11:00-13:00");
        assert_eq!(time_bucket(t(13, 0)), "13:00-14:30");
        assert_eq!(time_bucket(t(14, 29)), "13:00-14:30");
        assert_eq!(time_bucket(t(14, 30)), "14:30-15:30");
        assert_eq!(time_bucket(t(15, 25)), "14:30-15:30");
    }

    #[test]
    fn empty_group_stats() {
        let stats = group_stats("none", &[], PnlBasis::Points);
        assert_eq!(stats.trades, 0);
        assert_eq!(stats.net, 0.0);
        assert_eq!(stats.avg, None);
        assert_eq!(stats.max_win, None);
        assert_eq!(stats.profit_factor, None);
    }
}
