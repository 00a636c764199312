//! Filter variants: post-filters applied to simulated trades and compared
//! side by side.
//!
//! A variant never re-runs the simulator. Every trade is simulated once and
//! each variant selects a subset, so the comparison isolates the filter.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use pivotlab_core::{PivotLevel, SessionClock, Side, Signal};

use crate::breakdown::{group_stats, GroupStats, PnlBasis};
use crate::runner::TradeRow;

/// Which signals survive into the trade list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeFilter {
    /// Keep entries at or before this local time.
    pub entry_cutoff: Option<NaiveTime>,
    pub long_levels: Vec<PivotLevel>,
    pub short_levels: Vec<PivotLevel>,
}

impl Default for TradeFilter {
    fn default() -> Self {
        Self::all()
    }
}

impl TradeFilter {
    /// Keeps every signal the engine can emit.
    pub fn all() -> Self {
        Self {
            entry_cutoff: None,
            long_levels: PivotLevel::LONG_LEVELS.to_vec(),
            short_levels: PivotLevel::SHORT_LEVELS.to_vec(),
        }
    }

    pub fn with_cutoff(mut self, cutoff: NaiveTime) -> Self {
        self.entry_cutoff = Some(cutoff);
        self
    }

    pub fn with_levels(mut self, long: &[PivotLevel], short: &[PivotLevel]) -> Self {
        self.long_levels = long.to_vec();
        self.short_levels = short.to_vec();
        self
    }

    pub fn allows(&self, signal: &Signal, clock: &SessionClock) -> bool {
        let levels = match signal.side {
            Side::Long => &self.long_levels,
            Side::Short => &self.short_levels,
        };
        if !levels.contains(&signal.level) {
            return false;
        }
        match self.entry_cutoff {
            Some(cutoff) => clock.time_of_day(&signal.entry_time) <= cutoff,
            None => true,
        }
    }
}

/// A named filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    pub name: String,
    pub filter: TradeFilter,
}

impl Variant {
    pub fn new(name: impl Into<String>, filter: TradeFilter) -> Self {
        Self {
            name: name.into(),
            filter,
        }
    }
}

fn hm(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).expect("valid time literal")
}

/// The standard comparison set: baseline, entry cutoffs, level exclusions,
/// side-only, and each level exclusion combined with each cutoff.
pub fn standard_variants() -> Vec<Variant> {
    use PivotLevel::*;

    let cutoffs = [hm(14, 0), hm(14, 15), hm(14, 30)];
    let no_s2 = TradeFilter::all().with_levels(&[R1, R2], &[S1]);
    let only_s1 = TradeFilter::all().with_levels(&[], &[S1]);

    let mut variants = vec![Variant::new("Baseline (all trades)", TradeFilter::all())];
    for cutoff in cutoffs {
        variants.push(Variant::new(
            format!("Cutoff {}", cutoff.format("%H:%M")),
            TradeFilter::all().with_cutoff(cutoff),
        ));
    }
    variants.push(Variant::new("Exclude SHORT S2", no_s2.clone()));
    variants.push(Variant::new("Only SHORT S1", only_s1.clone()));
    variants.push(Variant::new(
        "Only SHORTs",
        TradeFilter::all().with_levels(&[], &[S1, S2]),
    ));
    variants.push(Variant::new(
        "Only LONGs",
        TradeFilter::all().with_levels(&[R1, R2], &[]),
    ));
    for cutoff in cutoffs {
        let label = cutoff.format("%H:%M");
        variants.push(Variant::new(
            format!("Exclude SHORT S2 + Cutoff {label}"),
            no_s2.clone().with_cutoff(cutoff),
        ));
        variants.push(Variant::new(
            format!("Only SHORT S1 + Cutoff {label}"),
            only_s1.clone().with_cutoff(cutoff),
        ));
    }
    variants
}

/// Statistics of one variant's surviving trades.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantResult {
    pub name: String,
    pub stats: GroupStats,
}

/// Evaluate every variant over `rows`, best first: net PnL, then profit
/// factor, then trade count, all descending. Undefined profit factors sort
/// last among equal net PnL.
pub fn compare_variants(
    rows: &[TradeRow],
    variants: &[Variant],
    basis: PnlBasis,
    clock: &SessionClock,
) -> Vec<VariantResult> {
    let mut results: Vec<VariantResult> = variants
        .iter()
        .map(|v| {
            let kept: Vec<&TradeRow> = rows
                .iter()
                .filter(|r| v.filter.allows(&r.signal, clock))
                .collect();
            VariantResult {
                name: v.name.clone(),
                stats: group_stats(v.name.clone(), &kept, basis),
            }
        })
        .collect();

    results.sort_by(|a, b| {
        b.stats
            .net
            .total_cmp(&a.stats.net)
            .then_with(|| {
                let pa = a.stats.profit_factor.unwrap_or(f64::NEG_INFINITY);
                let pb = b.stats.profit_factor.unwrap_or(f64::NEG_INFINITY);
                pb.total_cmp(&pa)
            })
            .then_with(|| b.stats.trades.cmp(&a.stats.trades))
    });
    results
}
