//! Command-line parsing for the `gt` gas tightness reporter.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! data, scoring, and reporting code. Defaults live in the argument definitions.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::domain::{Aggregation, DEFAULT_ACTUAL_ID, DEFAULT_FORECAST_ID, DEFAULT_LINEPACK_ID};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "gt", version, about = "GB gas system tightness score and daily report")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch National Gas data, score the panel, and write the daily report.
    Report(ReportArgs),
    /// Run the scoring and report path over a seeded synthetic panel (offline).
    Sample(SampleArgs),
    /// Print the recent-days table and headline from a processed panel CSV.
    Show(ShowArgs),
    /// Inspect or clear the raw response cache.
    Cache(CacheArgs),
}

#[derive(Debug, Args, Clone)]
pub struct ReportArgs {
    /// Last gas day to pull (YYYY-MM-DD). Defaults to yesterday.
    #[arg(long, value_name = "DATE")]
    pub end_date: Option<NaiveDate>,

    /// Number of gas days to pull, ending at --end-date.
    #[arg(long, default_value_t = 30)]
    pub lookback_days: usize,

    /// Publication id for the day-ahead demand forecast.
    #[arg(long, default_value = DEFAULT_FORECAST_ID)]
    pub forecast_id: String,

    /// Publication id for actual demand.
    #[arg(long, default_value = DEFAULT_ACTUAL_ID)]
    pub actual_id: String,

    /// Publication id for system linepack.
    #[arg(long, default_value = DEFAULT_LINEPACK_ID)]
    pub linepack_id: String,

    /// Daily aggregation for the forecast series [default: last].
    #[arg(long, value_enum)]
    pub forecast_agg: Option<Aggregation>,

    /// Daily aggregation for the actual demand series [default: last].
    #[arg(long, value_enum)]
    pub actual_agg: Option<Aggregation>,

    /// Daily aggregation for the linepack series [default: mean].
    #[arg(long, value_enum)]
    pub linepack_agg: Option<Aggregation>,

    /// Directory for cached raw responses.
    #[arg(long, default_value = "data/raw")]
    pub cache_dir: PathBuf,

    /// Neither read nor write the cache.
    #[arg(long)]
    pub no_cache: bool,

    /// Ignore cached responses (fresh downloads are still cached).
    #[arg(long, conflicts_with = "no_cache")]
    pub refresh: bool,

    #[command(flatten)]
    pub scoring: ScoringArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args, Clone)]
pub struct SampleArgs {
    /// Number of synthetic gas days.
    #[arg(long, default_value_t = 60)]
    pub days: usize,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Last synthetic gas day (YYYY-MM-DD). Defaults to yesterday.
    #[arg(long, value_name = "DATE")]
    pub end_date: Option<NaiveDate>,

    /// Hold linepack flat, which leaves every score undefined.
    #[arg(long)]
    pub constant_linepack: bool,

    #[command(flatten)]
    pub scoring: ScoringArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// Scoring options shared by `report` and `sample`.
#[derive(Debug, Args, Clone)]
pub struct ScoringArgs {
    /// Trailing window (days) for rolling normalisation.
    #[arg(long, default_value_t = 14)]
    pub window: usize,

    /// |score| at or above this is labelled long/short.
    #[arg(long, default_value_t = 0.5)]
    pub threshold: f64,

    /// Clip normalised components to +/- this value.
    #[arg(long, default_value_t = 5.0)]
    pub clip: f64,

    /// Disable clipping.
    #[arg(long)]
    pub no_clip: bool,

    /// Days shown in the report table.
    #[arg(long, default_value_t = 7)]
    pub table_days: usize,
}

/// Output locations shared by `report` and `sample`.
#[derive(Debug, Args, Clone)]
pub struct OutputArgs {
    /// Processed panel CSV.
    #[arg(long, default_value = "data/processed/daily_panel.csv")]
    pub panel_out: PathBuf,

    /// Directory for the Markdown report and chart files.
    #[arg(long, default_value = "reports")]
    pub reports_dir: PathBuf,
}

#[derive(Debug, Args, Clone)]
pub struct ShowArgs {
    /// Processed panel CSV written by `gt report` or `gt sample`.
    #[arg(long, value_name = "CSV", default_value = "data/processed/daily_panel.csv")]
    pub panel: PathBuf,

    /// Days to show.
    #[arg(long, default_value_t = 7)]
    pub days: usize,
}

#[derive(Debug, Args, Clone)]
pub struct CacheArgs {
    /// Directory for cached raw responses.
    #[arg(long, default_value = "data/raw")]
    pub cache_dir: PathBuf,

    /// Delete all cached responses.
    #[arg(long)]
    pub clear: bool,
}
