//! Reporting: headline selection, charts, the Markdown report, and terminal
//! tables.
//!
//! Charts and the Markdown body are rendered fully in memory, staged under
//! temporary names, and only then renamed into place. A failure at any step
//! removes whatever this run already wrote.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Days, NaiveDate};
use tracing::{info, warn};

use crate::domain::{OutputSettings, ScoredRow, ScoringConfig};
use crate::error::AppError;

pub mod charts;
pub mod format;
pub mod markdown;

pub use charts::{ChartKind, RenderedChart, render_charts};
pub use format::{format_headline, format_recent_table};
pub use markdown::render_markdown;

/// Files written by one report run.
#[derive(Debug, Clone)]
pub struct ReportArtifacts {
    pub markdown: PathBuf,
    pub charts: Vec<PathBuf>,
}

/// Most recent row that carries a tightness score.
pub fn latest_scored(rows: &[ScoredRow]) -> Option<&ScoredRow> {
    rows.iter().rev().find(|r| r.tightness_score.is_some())
}

/// Rows within the last `days` calendar days of the panel (inclusive of the last
/// day).
pub fn recent_rows(rows: &[ScoredRow], days: usize) -> &[ScoredRow] {
    let Some(last) = rows.last() else {
        return rows;
    };
    if days == 0 {
        return &rows[rows.len()..];
    }
    let cutoff = last
        .gas_day()
        .checked_sub_days(Days::new(days as u64 - 1))
        .unwrap_or(NaiveDate::MIN);
    let start = rows.partition_point(|r| r.gas_day() < cutoff);
    &rows[start..]
}

/// Report file for `report_date` inside `reports_dir`.
pub fn markdown_path(reports_dir: &Path, report_date: NaiveDate) -> PathBuf {
    reports_dir.join(format!("{report_date}.md"))
}

/// Render charts and the Markdown report, then write them to the reports
/// directory.
pub fn write_report(
    rows: &[ScoredRow],
    report_date: NaiveDate,
    scoring: &ScoringConfig,
    output: &OutputSettings,
) -> Result<ReportArtifacts, AppError> {
    if rows.is_empty() {
        return Err(AppError::invalid_data("No data available for report."));
    }

    let charts = render_charts(rows, report_date, scoring)?;
    let body = render_markdown(rows, report_date, &charts, scoring, output.table_days);

    let dir = &output.reports_dir;
    fs::create_dir_all(dir).map_err(|e| AppError::render_failure("reports directory", format!("{}: {e}", dir.display())))?;

    let chart_paths: Vec<PathBuf> = charts.iter().map(|c| dir.join(&c.file_name)).collect();
    let md_path = markdown_path(dir, report_date);

    let mut files: Vec<StagedFile<'_>> = charts
        .iter()
        .zip(&chart_paths)
        .map(|(chart, path)| StagedFile {
            path: path.clone(),
            contents: &chart.svg,
            stage: chart.kind.stage(),
        })
        .collect();
    files.push(StagedFile {
        path: md_path.clone(),
        contents: &body,
        stage: "markdown report",
    });
    write_all_or_nothing(&files)?;

    info!(report = %md_path.display(), charts = chart_paths.len(), "report written");

    Ok(ReportArtifacts {
        markdown: md_path,
        charts: chart_paths,
    })
}

struct StagedFile<'a> {
    path: PathBuf,
    contents: &'a str,
    stage: &'static str,
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write every file under a temporary name, then rename them all into place.
/// On failure, temporaries and files already renamed by this call are removed.
fn write_all_or_nothing(files: &[StagedFile<'_>]) -> Result<(), AppError> {
    let mut staged: Vec<(PathBuf, &StagedFile<'_>)> = Vec::with_capacity(files.len());
    for file in files {
        let tmp = staging_path(&file.path);
        if let Err(e) = fs::write(&tmp, file.contents) {
            let _ = fs::remove_file(&tmp);
            discard(staged.iter().map(|(t, _)| t));
            return Err(AppError::render_failure(file.stage, format!("{}: {e}", file.path.display())));
        }
        staged.push((tmp, file));
    }

    for (i, (tmp, file)) in staged.iter().enumerate() {
        if let Err(e) = fs::rename(tmp, &file.path) {
            discard(staged[..i].iter().map(|(_, f)| &f.path));
            discard(staged[i..].iter().map(|(t, _)| t));
            return Err(AppError::render_failure(file.stage, format!("{}: {e}", file.path.display())));
        }
    }
    Ok(())
}

fn discard<'a>(paths: impl Iterator<Item = &'a PathBuf>) {
    for path in paths {
        if let Err(e) = fs::remove_file(path) {
            warn!(path = %path.display(), error = %e, "failed to remove partial report file");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PanelRow;

    fn row(d: u32, score: Option<f64>) -> ScoredRow {
        ScoredRow {
            tightness_score: score,
            ..ScoredRow::unscored(PanelRow::empty(NaiveDate::from_ymd_opt(2025, 1, d).unwrap()))
        }
    }

    #[test]
    fn latest_scored_skips_unscored_tail() {
        let rows = vec![row(1, Some(0.1)), row(2, Some(0.2)), row(3, None)];
        assert_eq!(latest_scored(&rows).unwrap().gas_day().to_string(), "2025-01-02");
        assert!(latest_scored(&[row(1, None)]).is_none());
    }

    #[test]
    fn recent_rows_is_calendar_based() {
        let rows: Vec<_> = [1, 2, 5, 8, 9, 10].iter().map(|&d| row(d, None)).collect();
        let recent = recent_rows(&rows, 7);
        // 10th back 7 days -> from the 4th.
        let days: Vec<_> = recent.iter().map(|r| r.gas_day().to_string()).collect();
        assert_eq!(days, vec!["2025-01-05", "2025-01-08", "2025-01-09", "2025-01-10"]);
        assert_eq!(recent_rows(&rows, 100).len(), rows.len());
        assert!(recent_rows(&[], 7).is_empty());
    }

    fn scored_rows() -> Vec<ScoredRow> {
        (1..=10).map(|d| row(d, None)).collect()
    }

    fn output_in(reports_dir: PathBuf) -> OutputSettings {
        OutputSettings {
            panel_path: reports_dir.join("panel.csv"),
            reports_dir,
            table_days: 7,
        }
    }

    fn report_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 10).unwrap()
    }

    #[test]
    fn writes_charts_and_markdown_without_leftovers() {
        let temp_dir = tempfile::tempdir().unwrap();
        let output = output_in(temp_dir.path().join("reports"));

        let artifacts = write_report(&scored_rows(), report_date(), &ScoringConfig::default(), &output).unwrap();

        assert!(artifacts.markdown.ends_with("2025-01-10.md"));
        assert_eq!(artifacts.charts.len(), 3);
        let mut names: Vec<_> = fs::read_dir(&output.reports_dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                "2025-01-10.md",
                "demand_20250110.svg",
                "imbalance_and_score_20250110.svg",
                "linepack_20250110.svg",
            ]
        );
    }

    #[test]
    fn reports_dir_that_is_a_file_is_a_render_failure() {
        let temp_dir = tempfile::tempdir().unwrap();
        let blocker = temp_dir.path().join("reports");
        fs::write(&blocker, "not a directory").unwrap();

        let err = write_report(&scored_rows(), report_date(), &ScoringConfig::default(), &output_in(blocker))
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::RenderFailure);
    }

    #[test]
    fn failed_markdown_write_removes_the_charts() {
        let temp_dir = tempfile::tempdir().unwrap();
        let output = output_in(temp_dir.path().join("reports"));
        // A directory where the report file should go makes the final rename fail.
        fs::create_dir_all(markdown_path(&output.reports_dir, report_date()).join("occupied")).unwrap();

        let err = write_report(&scored_rows(), report_date(), &ScoringConfig::default(), &output).unwrap_err();

        assert_eq!(err.kind(), crate::error::ErrorKind::RenderFailure);
        assert!(err.to_string().contains("markdown report"));
        let names: Vec<_> = fs::read_dir(&output.reports_dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["2025-01-10.md"]);
    }

    #[test]
    fn empty_panel_is_an_error() {
        let output = OutputSettings {
            panel_path: PathBuf::from("unused.csv"),
            reports_dir: PathBuf::from("unused"),
            table_days: 7,
        };
        let err = write_report(
            &[],
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            &ScoringConfig::default(),
            &output,
        )
        .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::InvalidData);
    }
}
