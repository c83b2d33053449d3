//! fundlab CLI: fetch ticker fundamentals into a CSV table and filter it.
//!
//! Commands:
//! - `update`: fetch missing or incomplete tickers and rewrite the output table
//! - `filter`: keep rows strictly above six numeric thresholds
//! - `refresh-eps`: re-fetch EPS for every row of an existing table

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use fundlab_core::data::{
    run_refresh_eps, run_update, StdoutProgress, UpdateSummary, YahooFundamentals,
};
use fundlab_core::{run_filter, FundlabConfig, Thresholds};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "fundlab",
    about = "fundlab CLI: ticker fundamentals fetcher and threshold filter"
)]
struct Cli {
    /// Path to a TOML config file. Defaults are used when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch fundamentals for every missing or incomplete ticker.
    Update {
        /// CSV file with a `Ticker` column.
        input: PathBuf,

        /// Financial table to create or update.
        output: PathBuf,
    },
    /// Write rows strictly above every threshold to a new table.
    Filter {
        /// Financial table to read.
        source: PathBuf,

        /// Filtered table to write.
        dest: PathBuf,

        /// Total revenue threshold.
        #[arg(value_parser = parse_threshold, allow_hyphen_values = true)]
        total_revenue: f64,

        /// Net income threshold.
        #[arg(value_parser = parse_threshold, allow_hyphen_values = true)]
        net_income: f64,

        /// Net income to total revenue ratio threshold.
        #[arg(value_parser = parse_threshold, allow_hyphen_values = true)]
        ratio: f64,

        /// Market cap threshold.
        #[arg(value_parser = parse_threshold, allow_hyphen_values = true)]
        market_cap: f64,

        /// Free cash flow threshold.
        #[arg(value_parser = parse_threshold, allow_hyphen_values = true)]
        free_cash_flow: f64,

        /// EPS threshold.
        #[arg(value_parser = parse_threshold, allow_hyphen_values = true)]
        eps: f64,
    },
    /// Re-fetch EPS for every row of a table and write the result to a new table.
    RefreshEps {
        /// Financial table to read.
        source: PathBuf,

        /// Table to write.
        dest: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match &cli.config {
        Some(path) => FundlabConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => FundlabConfig::default(),
    };
    debug!(?config, "resolved configuration");

    match cli.command {
        Commands::Update { input, output } => run_update_cmd(&config, &input, &output),
        Commands::Filter {
            source,
            dest,
            total_revenue,
            net_income,
            ratio,
            market_cap,
            free_cash_flow,
            eps,
        } => {
            let thresholds = Thresholds {
                total_revenue,
                net_income,
                ratio,
                market_cap,
                free_cash_flow,
                eps,
            };
            run_filter_cmd(&source, &dest, &thresholds)
        }
        Commands::RefreshEps { source, dest } => run_refresh_eps_cmd(&config, &source, &dest),
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Parse a threshold. Any number is accepted except NaN.
fn parse_threshold(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .trim()
        .parse()
        .map_err(|_| format!("'{s}' is not a number"))?;
    if value.is_nan() {
        return Err("NaN is not a valid threshold".into());
    }
    Ok(value)
}

fn run_update_cmd(config: &FundlabConfig, input: &Path, output: &Path) -> Result<()> {
    let provider = YahooFundamentals::new(&config.provider)?;
    let summary = run_update(&provider, input, output, &StdoutProgress)
        .with_context(|| format!("Update of {} failed", output.display()))?;
    report_failures(&summary);
    println!("Financial data written to {}", output.display());
    Ok(())
}

fn run_filter_cmd(source: &Path, dest: &Path, thresholds: &Thresholds) -> Result<()> {
    let summary = run_filter(source, dest, thresholds)
        .with_context(|| format!("Failed to filter {}", source.display()))?;
    if summary.passed == 0 {
        println!("No data met the criteria.");
    } else {
        println!(
            "Filtered data has been written to {} ({} of {} rows).",
            dest.display(),
            summary.passed,
            summary.scanned
        );
    }
    Ok(())
}

fn run_refresh_eps_cmd(config: &FundlabConfig, source: &Path, dest: &Path) -> Result<()> {
    let provider = YahooFundamentals::new(&config.provider)?;
    let summary = run_refresh_eps(&provider, source, dest, &StdoutProgress)
        .with_context(|| format!("Failed to refresh EPS from {}", source.display()))?;
    report_failures(&summary);
    println!(
        "Successfully updated {} rows with EPS data and saved to {}",
        summary.total,
        dest.display()
    );
    Ok(())
}

/// Per-ticker failures are reported, never fatal. Those tickers stay
/// incomplete and are fetched again on the next run.
fn report_failures(summary: &UpdateSummary) {
    if summary.all_succeeded() {
        return;
    }
    for (sym, err) in &summary.errors {
        eprintln!("Error processing {sym}: {err}");
    }
}
