//! Shared report pipeline used by the `report` and `sample` commands.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! fetch -> aggregate/join -> score -> panel CSV -> charts + Markdown
//!
//! The front-ends then only decide where the panel comes from.

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::data::{DataClient, NationalGasApi, RawCache, SeriesSource};
use crate::dataset::build_panel;
use crate::domain::{OutputSettings, Panel, ReportConfig, ScoredRow, ScoringConfig};
use crate::error::AppError;
use crate::io::write_scored_panel_csv;
use crate::report::{ReportArtifacts, write_report};

/// All computed outputs of a single report run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub rows: Vec<ScoredRow>,
    pub artifacts: ReportArtifacts,
}

/// Fetch from National Gas (through the raw cache when enabled) and report.
pub fn run_report(config: &ReportConfig) -> Result<RunOutput, AppError> {
    config.validate()?;

    let mut client = DataClient::new(NationalGasApi::from_env()?).with_refresh(config.cache.refresh);
    if config.cache.enabled {
        match RawCache::new(&config.cache.dir) {
            Ok(cache) => client = client.with_cache(cache),
            Err(e) => warn!(error = %e, "cache unavailable; continuing without it"),
        }
    }

    run_report_with_source(config, &client)
}

/// Build the panel from any observation source and report on it.
pub fn run_report_with_source<S: SeriesSource>(config: &ReportConfig, source: &S) -> Result<RunOutput, AppError> {
    config.validate()?;

    let start = config.start_date();
    info!(%start, end = %config.end_date, series = config.series.len(), "building panel");
    let panel = build_panel(source, &config.series, start, config.end_date)?;

    run_report_with_panel(&panel, config.end_date, &config.scoring, &config.output)
}

/// Score an already-built panel, write the report dated `report_date`, then the
/// panel CSV.
pub fn run_report_with_panel(
    panel: &Panel,
    report_date: NaiveDate,
    scoring: &ScoringConfig,
    output: &OutputSettings,
) -> Result<RunOutput, AppError> {
    scoring.validate()?;
    if output.table_days == 0 {
        return Err(AppError::config("Table must show at least 1 day."));
    }
    if panel.is_empty() {
        return Err(AppError::invalid_data("No data available for report."));
    }

    let rows = crate::score::score_panel(panel, scoring);
    let scored = rows.iter().filter(|r| r.tightness_score.is_some()).count();
    info!(days = rows.len(), scored, "panel scored");

    // Render before touching the panel file so a render failure leaves nothing new behind.
    let artifacts = write_report(&rows, report_date, scoring, output)?;
    write_scored_panel_csv(&output.panel_path, &rows)?;
    info!(path = %output.panel_path.display(), "panel written");

    Ok(RunOutput { rows, artifacts })
}
