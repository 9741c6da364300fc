//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - sets up logging
//! - parses CLI arguments into run configuration
//! - dispatches to the report pipeline, the panel viewer, or cache maintenance

use chrono::{Days, Local, NaiveDate};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{CacheArgs, Command, OutputArgs, ReportArgs, SampleArgs, ScoringArgs, ShowArgs};
use crate::data::{RawCache, SampleConfig, generate_panel};
use crate::domain::{CacheSettings, OutputSettings, ReportConfig, ScoringConfig, SeriesColumn, SeriesSpec};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `gt` binary.
pub fn run() -> Result<(), AppError> {
    init_tracing();

    // `gt` and `gt --end-date ...` behave like `gt report ...`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Report(args) => handle_report(args),
        Command::Sample(args) => handle_sample(args),
        Command::Show(args) => handle_show(args),
        Command::Cache(args) => handle_cache(args),
    }
}

/// Logs go to stderr so stdout stays clean for results. `RUST_LOG` overrides the
/// default `info` filter.
fn init_tracing() {
    dotenvy::dotenv().ok();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn handle_report(args: ReportArgs) -> Result<(), AppError> {
    let config = report_config_from_args(&args, default_end_date()?)?;
    let run = pipeline::run_report(&config)?;
    print_run(&run);
    Ok(())
}

fn handle_sample(args: SampleArgs) -> Result<(), AppError> {
    let end_date = match args.end_date {
        Some(d) => d,
        None => default_end_date()?,
    };
    let sample = SampleConfig {
        constant_linepack: args.constant_linepack,
        ..SampleConfig::new(end_date, args.days, args.seed)
    };
    let scoring = scoring_config_from_args(&args.scoring);
    let output = output_settings_from_args(&args.output, &args.scoring);

    let panel = generate_panel(&sample)?;
    let run = pipeline::run_report_with_panel(&panel, end_date, &scoring, &output)?;
    print_run(&run);
    Ok(())
}

fn handle_show(args: ShowArgs) -> Result<(), AppError> {
    if args.days == 0 {
        return Err(AppError::config("--days must be at least 1."));
    }
    let rows = crate::io::read_scored_panel_csv(&args.panel)?;
    if rows.is_empty() {
        return Err(AppError::invalid_data(format!(
            "Panel file '{}' has no rows.",
            args.panel.display()
        )));
    }
    println!("{}", crate::report::format_headline(&rows));
    println!();
    print!("{}", crate::report::format_recent_table(&rows, args.days));
    Ok(())
}

fn handle_cache(args: CacheArgs) -> Result<(), AppError> {
    let cache = RawCache::new(&args.cache_dir)?;
    if args.clear {
        let removed = cache.clear()?;
        println!("Removed {removed} cached response(s) from {}", cache.dir().display());
    } else {
        println!("{} cached response(s) in {}", cache.len()?, cache.dir().display());
    }
    Ok(())
}

fn print_run(run: &pipeline::RunOutput) {
    println!("{}", crate::report::format_headline(&run.rows));
    println!("Report: {}", run.artifacts.markdown.display());
    for chart in &run.artifacts.charts {
        println!("Chart:  {}", chart.display());
    }
}

/// Yesterday, local time: the latest gas day with a full set of publications.
fn default_end_date() -> Result<NaiveDate, AppError> {
    Local::now()
        .date_naive()
        .checked_sub_days(Days::new(1))
        .ok_or_else(|| AppError::config("Cannot derive a default end date."))
}

pub fn report_config_from_args(args: &ReportArgs, default_end: NaiveDate) -> Result<ReportConfig, AppError> {
    let mut series = Vec::with_capacity(3);
    for (column, id, agg) in [
        (SeriesColumn::ForecastDemand, &args.forecast_id, args.forecast_agg),
        (SeriesColumn::ActualDemand, &args.actual_id, args.actual_agg),
        (SeriesColumn::Linepack, &args.linepack_id, args.linepack_agg),
    ] {
        let id = id.trim();
        if id.is_empty() {
            return Err(AppError::config(format!(
                "Empty publication id for {}.",
                column.display_name()
            )));
        }
        let spec = SeriesSpec::new(column, id);
        series.push(match agg {
            Some(agg) => spec.with_aggregation(agg),
            None => spec,
        });
    }

    let config = ReportConfig {
        end_date: args.end_date.unwrap_or(default_end),
        lookback_days: args.lookback_days,
        series,
        scoring: scoring_config_from_args(&args.scoring),
        cache: CacheSettings {
            dir: args.cache_dir.clone(),
            enabled: !args.no_cache,
            refresh: args.refresh,
        },
        output: output_settings_from_args(&args.output, &args.scoring),
    };
    config.validate()?;
    Ok(config)
}

pub fn scoring_config_from_args(args: &ScoringArgs) -> ScoringConfig {
    ScoringConfig {
        window_days: args.window,
        threshold: args.threshold,
        clip: if args.no_clip { None } else { Some(args.clip) },
        ..ScoringConfig::default()
    }
}

pub fn output_settings_from_args(output: &OutputArgs, scoring: &ScoringArgs) -> OutputSettings {
    OutputSettings {
        panel_path: output.panel_out.clone(),
        reports_dir: output.reports_dir.clone(),
        table_days: scoring.table_days,
    }
}

/// Rewrite argv so `gt` defaults to `gt report`.
///
/// Rules:
/// - `gt`                      -> `gt report`
/// - `gt --end-date D ...`     -> `gt report --end-date D ...`
/// - `gt --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("report".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(arg1.as_str(), "-h" | "--help" | "-V" | "--version" | "help");
    if is_top_level_help_or_version {
        return argv;
    }

    if arg1.starts_with('-') {
        argv.insert(1, "report".to_string());
    }
    argv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn report_args(extra: &[&str]) -> ReportArgs {
        let mut all = vec!["gt", "report"];
        all.extend_from_slice(extra);
        match crate::cli::Cli::parse_from(all).command {
            Command::Report(args) => args,
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn bare_invocation_defaults_to_report() {
        assert_eq!(rewrite_args(argv(&["gt"])), argv(&["gt", "report"]));
        assert_eq!(
            rewrite_args(argv(&["gt", "--window", "7"])),
            argv(&["gt", "report", "--window", "7"])
        );
        assert_eq!(rewrite_args(argv(&["gt", "--help"])), argv(&["gt", "--help"]));
        assert_eq!(rewrite_args(argv(&["gt", "show"])), argv(&["gt", "show"]));
    }

    #[test]
    fn report_config_uses_defaults() {
        let yesterday = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
        let config = report_config_from_args(&report_args(&[]), yesterday).unwrap();

        assert_eq!(config.end_date, yesterday);
        assert_eq!(config.start_date(), NaiveDate::from_ymd_opt(2025, 2, 8).unwrap());
        assert_eq!(config.series, SeriesSpec::default_set());
        assert_eq!(config.scoring, ScoringConfig::default());
        assert!(config.cache.enabled);
        assert_eq!(config.output.table_days, 7);
    }

    #[test]
    fn report_config_applies_overrides() {
        let config = report_config_from_args(
            &report_args(&["--end-date", "2025-01-15", "--linepack-agg", "last", "--no-clip", "--no-cache"]),
            NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
        )
        .unwrap();

        assert_eq!(config.end_date, NaiveDate::from_ymd_opt(2025, 1, 15).unwrap());
        assert_eq!(config.series[2].aggregation, crate::domain::Aggregation::Last);
        assert_eq!(config.scoring.clip, None);
        assert!(!config.cache.enabled);
    }

    #[test]
    fn invalid_scoring_flags_are_config_errors() {
        let err = report_config_from_args(
            &report_args(&["--window", "1"]),
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Config);
    }
}
