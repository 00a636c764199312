//! Reporting and export — JSON, CSV, and Markdown artifact generation.
//!
//! Provides three export formats for backtest results:
//! - **JSON**: full round-trip serialization with schema versioning
//! - **CSV**: one row per trade, lot exits and cost columns flattened
//! - **Markdown**: summary, grouped breakdowns and variant comparison
//!
//! All persisted artifacts include a `schema_version` field. Unknown versions
//! are rejected on load. Lot exit timestamps are written verbatim (RFC 3339
//! with offset) so downstream option pricing can look up the same instants.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, FixedOffset};

use crate::breakdown::{Breakdowns, GroupStats};
use crate::runner::{BacktestResult, SingleExitRun, TradeRow, SCHEMA_VERSION};
use crate::variants::VariantResult;

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `BacktestResult` to pretty JSON.
pub fn export_json(result: &BacktestResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize BacktestResult to JSON")
}

/// Deserialize a `BacktestResult` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<BacktestResult> {
    let result: BacktestResult =
        serde_json::from_str(json).context("failed to deserialize BacktestResult from JSON")?;
    if result.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            result.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(result)
}

// ─── CSV export ─────────────────────────────────────────────────────

fn opt_f(v: Option<f64>, precision: usize) -> String {
    v.map(|x| format!("{x:.precision$}")).unwrap_or_default()
}

fn opt_ts(v: Option<DateTime<FixedOffset>>) -> String {
    v.map(|t| t.to_rfc3339()).unwrap_or_default()
}

/// Export scale-out trades as CSV.
///
/// Columns: side, level, level_value, signal_time, entry_time, entry, sl,
/// tp, risk_points, tp1_rr, lot1_exit_time, lot1_exit_price, lot1_reason,
/// lot1_pnl_points, lot2_exit_time, lot2_exit_price, lot2_reason,
/// lot2_pnl_points, lot2_final_sl, mfe_points, mae_points, total_points,
/// effective_points_per_lot, gross_total, net_total, net_effective_per_lot
pub fn export_trades_csv(trades: &[TradeRow]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "side",
        "level",
        "level_value",
        "signal_time",
        "entry_time",
        "entry",
        "sl",
        "tp",
        "risk_points",
        "tp1_rr",
        "lot1_exit_time",
        "lot1_exit_price",
        "lot1_reason",
        "lot1_pnl_points",
        "lot2_exit_time",
        "lot2_exit_price",
        "lot2_reason",
        "lot2_pnl_points",
        "lot2_final_sl",
        "mfe_points",
        "mae_points",
        "total_points",
        "effective_points_per_lot",
        "gross_total",
        "net_total",
        "net_effective_per_lot",
    ])?;

    for t in trades {
        let s = &t.signal;
        let r = &t.result;
        wtr.write_record([
            s.side.as_str(),
            s.level.as_str(),
            &format!("{:.2}", s.level_value),
            &s.signal_time.to_rfc3339(),
            &s.entry_time.to_rfc3339(),
            &format!("{:.2}", s.fut_entry),
            &format!("{:.2}", s.fut_sl),
            &format!("{:.2}", s.fut_tp),
            &format!("{:.2}", t.risk_points),
            &opt_f(t.tp1_rr, 3),
            &opt_ts(r.lot1.exit_time),
            &opt_f(r.lot1.exit_price, 2),
            r.lot1.reason.as_str(),
            &opt_f(r.lot1.pnl_points, 2),
            &opt_ts(r.lot2.exit_time),
            &opt_f(r.lot2.exit_price, 2),
            r.lot2.reason.as_str(),
            &opt_f(r.lot2.pnl_points, 2),
            &opt_f(r.lot2_final_stop, 2),
            &opt_f(r.mfe_points, 2),
            &opt_f(r.mae_points, 2),
            &opt_f(r.total_points, 2),
            &opt_f(r.effective_points_per_lot, 2),
            &opt_f(t.pnl.map(|p| p.gross_total), 2),
            &opt_f(t.pnl.map(|p| p.net_total), 2),
            &opt_f(t.pnl.map(|p| p.net_effective_per_lot), 2),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Export single-exit trades as CSV.
pub fn export_single_exit_csv(run: &SingleExitRun) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "side",
        "level",
        "signal_time",
        "entry_time",
        "entry",
        "sl",
        "tp",
        "risk_points",
        "rr",
        "exit_time",
        "exit_price",
        "exit_reason",
        "pnl_points",
        "win",
        "net_pnl",
    ])?;
    for t in &run.trades {
        let s = &t.signal;
        wtr.write_record([
            s.side.as_str(),
            s.level.as_str(),
            &s.signal_time.to_rfc3339(),
            &s.entry_time.to_rfc3339(),
            &format!("{:.2}", s.fut_entry),
            &format!("{:.2}", s.fut_sl),
            &format!("{:.2}", s.fut_tp),
            &format!("{:.2}", t.risk_points),
            &opt_f(t.rr, 3),
            &opt_ts(t.result.exit_time),
            &opt_f(t.result.exit_price, 2),
            t.result.reason.as_str(),
            &opt_f(t.result.pnl_points, 2),
            &t.result.win.map(|w| w.to_string()).unwrap_or_default(),
            &opt_f(t.net_pnl, 2),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

fn create_run_dir(output_dir: &Path, prefix: &str, run_id: &str) -> Result<PathBuf> {
    let dirname = format!(
        "{}_{}_{}",
        prefix,
        run_id.get(..8).unwrap_or(run_id),
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    );
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;
    Ok(run_dir)
}

/// Save the full artifact set for a scale-out run.
///
/// Creates a directory named `scaleout_{run_id}_{timestamp}/` under
/// `output_dir` containing:
/// - `manifest.json` — the full `BacktestResult`
/// - `trades.csv` — one row per signal
/// - `report.md` — summary plus breakdowns and variants when given
///
/// Returns the path to the created directory.
pub fn save_artifacts(
    result: &BacktestResult,
    breakdowns: Option<&Breakdowns>,
    variants: Option<&[VariantResult]>,
    output_dir: &Path,
) -> Result<PathBuf> {
    let run_dir = create_run_dir(output_dir, "scaleout", &result.run_id)?;

    let json = export_json(result)?;
    std::fs::write(run_dir.join("manifest.json"), &json)?;

    let trades_csv = export_trades_csv(&result.trades)?;
    std::fs::write(run_dir.join("trades.csv"), &trades_csv)?;

    let report = generate_report(result, breakdowns, variants);
    std::fs::write(run_dir.join("report.md"), &report)?;

    Ok(run_dir)
}

/// Save `manifest.json` and `trades.csv` for a single-exit run.
pub fn save_single_exit_artifacts(run: &SingleExitRun, output_dir: &Path) -> Result<PathBuf> {
    let run_dir = create_run_dir(output_dir, "single", &run.run_id)?;
    let json =
        serde_json::to_string_pretty(run).context("failed to serialize SingleExitRun to JSON")?;
    std::fs::write(run_dir.join("manifest.json"), &json)?;
    std::fs::write(run_dir.join("trades.csv"), export_single_exit_csv(run)?)?;
    Ok(run_dir)
}

/// Load a `BacktestResult` from an artifact directory's manifest.json.
///
/// Rejects unknown schema versions.
pub fn load_artifacts(dir: &Path) -> Result<BacktestResult> {
    let manifest_path = dir.join("manifest.json");
    let json = std::fs::read_to_string(&manifest_path)
        .with_context(|| format!("failed to read {}", manifest_path.display()))?;
    import_json(&json)
}

// ─── Markdown reports ───────────────────────────────────────────────

fn fmt_pf(pf: Option<f64>) -> String {
    pf.map(|v| format!("{v:.2}")).unwrap_or_else(|| "n/a".into())
}

fn fmt_opt(v: Option<f64>) -> String {
    v.map(|x| format!("{x:.2}")).unwrap_or_else(|| "-".into())
}

fn push_group_table(md: &mut String, title: &str, rows: &[GroupStats]) {
    md.push_str(&format!("### {title}\n\n"));
    if rows.is_empty() {
        md.push_str("_No trades._\n\n");
        return;
    }
    md.push_str("| Group | Trades | Win % | Net | Avg | Median | Avg win | Avg loss | Max win | Max loss | PF |\n");
    md.push_str("| --- | ---: | ---: | ---: | ---: | ---: | ---: | ---: | ---: | ---: | ---: |\n");
    for g in rows {
        md.push_str(&format!(
            "| {} | {} | {:.1} | {:.2} | {} | {} | {} | {} | {} | {} | {} |\n",
            g.key,
            g.trades,
            g.win_rate * 100.0,
            g.net,
            fmt_opt(g.avg),
            fmt_opt(g.median),
            fmt_opt(g.avg_win),
            fmt_opt(g.avg_loss),
            fmt_opt(g.max_win),
            fmt_opt(g.max_loss),
            fmt_pf(g.profit_factor),
        ));
    }
    md.push('\n');
}

/// Generate a Markdown report for a scale-out run.
pub fn generate_report(
    result: &BacktestResult,
    breakdowns: Option<&Breakdowns>,
    variants: Option<&[VariantResult]>,
) -> String {
    let mut md = String::with_capacity(4096);
    let s = &result.summary;
    let costs = &result.config.costs;

    md.push_str("# Pivot Breakout Scale-Out Report\n\n");

    md.push_str("## Metadata\n\n");
    md.push_str("| Field | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Run ID | `{}` |\n", result.run_id));
    let period = match (result.start_date, result.end_date) {
        (Some(a), Some(b)) => format!("{a} to {b}"),
        _ => "-".into(),
    };
    md.push_str(&format!("| Period | {period} |\n"));
    md.push_str(&format!("| Candles | {} |\n", result.candle_count));
    md.push_str(&format!(
        "| Signals | {} ({} filtered out) |\n",
        result.signal_count, result.filtered_out
    ));
    md.push_str(&format!("| Dataset hash | `{}` |\n", result.dataset_hash));
    if result.has_synthetic {
        md.push_str("| Data | **SYNTHETIC** |\n");
    }
    md.push_str(&format!(
        "| Costs | slippage {}/side, charges {}/lot, lot size {} |\n\n",
        costs.slippage_per_side, costs.charges_per_lot_roundtrip, costs.lot_size
    ));

    md.push_str("## Summary\n\n");
    md.push_str("| Metric | Value |\n");
    md.push_str("| --- | ---: |\n");
    md.push_str(&format!("| Trades | {} |\n", s.trades));
    md.push_str(&format!("| NO_DATA (excluded) | {} |\n", s.no_data));
    md.push_str(&format!("| Wins / Losses | {} / {} |\n", s.wins, s.losses));
    md.push_str(&format!("| Win rate | {:.1}% |\n", s.win_rate * 100.0));
    md.push_str(&format!(
        "| TP1 hits | {} ({:.1}%) |\n",
        s.tp1_hits,
        s.tp1_rate * 100.0
    ));
    md.push_str(&format!("| Net points | {:.2} |\n", s.net_points));
    md.push_str(&format!("| Avg points/trade | {:.2} |\n", s.avg_points_per_trade));
    md.push_str(&format!(
        "| Effective points/lot | {:.2} |\n",
        s.effective_points_per_lot
    ));
    md.push_str(&format!("| Gross PnL | {:.2} |\n", s.gross_pnl));
    md.push_str(&format!("| Net PnL | {:.2} |\n", s.net_pnl));
    md.push_str(&format!("| Profit factor | {} |\n", fmt_pf(s.profit_factor)));
    md.push_str(&format!("| Avg MFE / MAE | {:.2} / {:.2} |\n\n", s.avg_mfe, s.avg_mae));

    if !result.data_quality_warnings.is_empty() {
        md.push_str("## Data Quality\n\n");
        for w in &result.data_quality_warnings {
            md.push_str(&format!("- {w}\n"));
        }
        md.push('\n');
    }

    if let Some(b) = breakdowns {
        md.push_str(&format!("## Breakdowns ({:?})\n\n", b.basis));
        for (title, rows) in b.tables() {
            push_group_table(&mut md, title, rows);
        }
    }

    if let Some(vs) = variants {
        md.push_str("## Filter Variants\n\n");
        md.push_str("| Variant | Trades | Win % | Net | Avg | PF |\n");
        md.push_str("| --- | ---: | ---: | ---: | ---: | ---: |\n");
        for v in vs {
            md.push_str(&format!(
                "| {} | {} | {:.1} | {:.2} | {} | {} |\n",
                v.name,
                v.stats.trades,
                v.stats.win_rate * 100.0,
                v.stats.net,
                fmt_opt(v.stats.avg),
                fmt_pf(v.stats.profit_factor),
            ));
        }
        md.push('\n');
    }

    md
}
