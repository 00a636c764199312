//! PivotLab CLI — signal scan, backtest and report commands.
//!
//! Commands:
//! - `signals` — list breakout signals detected in a candle file
//! - `backtest` — simulate every signal (scale-out or single-exit) and save artifacts
//! - `report` — print a Markdown report with breakdowns and filter variants

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;

use pivotlab_core::SessionClock;
use pivotlab_runner::data_loader::synthetic_dataset;
use pivotlab_runner::export::{generate_report, save_artifacts, save_single_exit_artifacts};
use pivotlab_runner::{
    compare_variants, detect_signals, load_candles_csv, run_backtest_from_data, run_single_exit,
    standard_variants, BacktestConfig, BacktestResult, Breakdowns, LoadedCandles, PnlBasis,
    SingleExitRun,
};

#[derive(Parser)]
#[command(
    name = "pivotlab",
    about = "PivotLab CLI — intraday pivot breakout backtester"
)]
struct Cli {
    /// Log at debug level (overridden by RUST_LOG).
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Where candles come from.
#[derive(clap::Args)]
struct DataArgs {
    /// Candle CSV (date,open,high,low,close,volume; RFC 3339 timestamps).
    #[arg(long)]
    data: Option<PathBuf>,

    /// Generate this many synthetic sessions instead of reading --data.
    #[arg(long, conflicts_with = "data")]
    synthetic: Option<usize>,

    /// Path to a TOML config file. Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    /// Two lots: fixed target plus break-even/trailing runner.
    Scaleout,
    /// One lot: the signal's own target and stop.
    Single,
}

#[derive(Subcommand)]
enum Commands {
    /// List detected breakout signals.
    Signals {
        #[command(flatten)]
        data: DataArgs,

        /// Show only the most recent N signals.
        #[arg(long)]
        last: Option<usize>,

        /// Print signals as JSON instead of a table.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Simulate every signal and save artifacts.
    Backtest {
        #[command(flatten)]
        data: DataArgs,

        #[arg(long, value_enum, default_value_t = Mode::Scaleout)]
        mode: Mode,

        /// Output directory for artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,
    },
    /// Print a Markdown report for a scale-out run.
    Report {
        #[command(flatten)]
        data: DataArgs,

        /// Include the filter-variant comparison.
        #[arg(long, default_value_t = false)]
        variants: bool,

        /// Include grouped breakdowns.
        #[arg(long, default_value_t = false)]
        breakdown: bool,

        /// Aggregate net currency instead of points.
        #[arg(long, default_value_t = false)]
        currency: bool,

        /// Write the report here instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Signals { data, last, json } => run_signals(&data, last, json),
        Commands::Backtest {
            data,
            mode,
            output_dir,
        } => run_backtest_cmd(&data, mode, &output_dir),
        Commands::Report {
            data,
            variants,
            breakdown,
            currency,
            output,
        } => run_report(&data, variants, breakdown, currency, output.as_deref()),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_inputs(args: &DataArgs) -> Result<(BacktestConfig, LoadedCandles)> {
    let config = match &args.config {
        Some(path) => BacktestConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => BacktestConfig::default(),
    };

    let data = match (&args.data, args.synthetic) {
        (Some(path), _) => load_candles_csv(path)
            .with_context(|| format!("failed to load candles from {}", path.display()))?,
        (None, Some(days)) => {
            let clock = config.clock()?;
            let start = NaiveDate::from_ymd_opt(2024, 1, 1).context("invalid start date")?;
            info!(days, "generating synthetic candles");
            synthetic_dataset(start, days, "pivotlab-synthetic", &clock)
        }
        (None, None) => bail!("one of --data or --synthetic is required"),
    };
    Ok((config, data))
}

fn run_signals(args: &DataArgs, last: Option<usize>, json: bool) -> Result<()> {
    let (config, data) = load_inputs(args)?;
    let scan = detect_signals(&data.candles, &config)?;
    let skip = last.map_or(0, |n| scan.signals.len().saturating_sub(n));
    let shown = &scan.signals[skip..];

    if json {
        println!("{}", serde_json::to_string_pretty(shown)?);
        return Ok(());
    }

    println!(
        "{:<25} {:<25} {:<6} {:<5} {:>10} {:>10} {:>10} {:>10}",
        "signal_time", "entry_time", "side", "level", "level", "entry", "sl", "tp"
    );
    for s in shown {
        println!(
            "{:<25} {:<25} {:<6} {:<5} {:>10.2} {:>10.2} {:>10.2} {:>10.2}",
            s.signal_time.to_rfc3339(),
            s.entry_time.to_rfc3339(),
            s.side,
            s.level,
            s.level_value,
            s.fut_entry,
            s.fut_sl,
            s.fut_tp
        );
    }
    println!();
    println!(
        "{} signal(s) ({} removed by filters, {} rejected for risk)",
        scan.signals.len(),
        scan.filtered_out,
        scan.stats.rejected_risk
    );
    Ok(())
}

fn run_backtest_cmd(args: &DataArgs, mode: Mode, output_dir: &Path) -> Result<()> {
    let (config, data) = load_inputs(args)?;
    match mode {
        Mode::Scaleout => {
            let result = run_backtest_from_data(&data, &config)?;
            print_summary(&result);
            let clock = config.clock()?;
            let breakdowns = Breakdowns::compute(&result.trades, PnlBasis::Points, &clock);
            let run_dir = save_artifacts(&result, Some(&breakdowns), None, output_dir)?;
            println!("Artifacts saved to: {}", run_dir.display());
        }
        Mode::Single => {
            let run = run_single_exit(&data, &config)?;
            print_single_summary(&run);
            let run_dir = save_single_exit_artifacts(&run, output_dir)?;
            println!("Artifacts saved to: {}", run_dir.display());
        }
    }
    Ok(())
}

fn run_report(
    args: &DataArgs,
    variants: bool,
    breakdown: bool,
    currency: bool,
    output: Option<&Path>,
) -> Result<()> {
    let (config, data) = load_inputs(args)?;
    let clock: SessionClock = config.clock()?;
    let basis = if currency {
        PnlBasis::NetCurrency
    } else {
        PnlBasis::Points
    };

    let result = run_backtest_from_data(&data, &config)?;
    let breakdowns = breakdown.then(|| Breakdowns::compute(&result.trades, basis, &clock));

    // Variants choose their own filters, so they start from every signal.
    let variant_results = if variants {
        let unfiltered = run_backtest_from_data(&data, &config.without_filters())?;
        Some(compare_variants(
            &unfiltered.trades,
            &standard_variants(),
            basis,
            &clock,
        ))
    } else {
        None
    };

    let md = generate_report(&result, breakdowns.as_ref(), variant_results.as_deref());
    match output {
        Some(path) => {
            std::fs::write(path, &md)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Report written to: {}", path.display());
        }
        None => print!("{md}"),
    }
    Ok(())
}

fn fmt_pf(pf: Option<f64>) -> String {
    pf.map(|v| format!("{v:.2}")).unwrap_or_else(|| "n/a".into())
}

fn print_summary(result: &BacktestResult) {
    let s = &result.summary;
    println!();
    println!("=== Scale-Out Backtest ===");
    if let (Some(start), Some(end)) = (result.start_date, result.end_date) {
        println!("Period:         {start} to {end}");
    }
    println!("Candles:        {}", result.candle_count);
    println!(
        "Signals:        {} ({} filtered out)",
        result.signal_count, result.filtered_out
    );
    println!("Trades:         {} ({} NO_DATA)", s.trades, s.no_data);
    println!();
    println!("--- Performance ---");
    println!("Win Rate:       {:.1}%", s.win_rate * 100.0);
    println!("TP1 Hit Rate:   {:.1}%", s.tp1_rate * 100.0);
    println!("Net Points:     {:.2}", s.net_points);
    println!("Avg Pts/Trade:  {:.2}", s.avg_points_per_trade);
    println!("Eff Pts/Lot:    {:.2}", s.effective_points_per_lot);
    println!("Net PnL:        {:.2}", s.net_pnl);
    println!("Profit Factor:  {}", fmt_pf(s.profit_factor));
    println!("Avg MFE/MAE:    {:.2} / {:.2}", s.avg_mfe, s.avg_mae);
    if result.has_synthetic {
        println!();
        println!("WARNING: Results based on SYNTHETIC data");
    }
    for warn in &result.data_quality_warnings {
        println!("WARNING: {warn}");
    }
    println!();
}

fn print_single_summary(run: &SingleExitRun) {
    let s = &run.summary;
    println!();
    println!("=== Single-Exit Backtest ===");
    println!("Candles:        {}", run.candle_count);
    println!(
        "Signals:        {} ({} filtered out)",
        run.signal_count, run.filtered_out
    );
    println!("Trades:         {} ({} NO_DATA)", s.trades, s.no_data);
    println!("Win Rate:       {:.1}%", s.win_rate * 100.0);
    println!("Net Points:     {:.2}", s.net_points);
    println!("Net PnL:        {:.2}", s.net_pnl);
    println!("Profit Factor:  {}", fmt_pf(s.profit_factor));
    if run.has_synthetic {
        println!();
        println!("WARNING: Results based on SYNTHETIC data");
    }
    for warn in &run.data_quality_warnings {
        println!("WARNING: {warn}");
    }
    println!();
}
