//! Markdown report body.

use chrono::NaiveDate;

use crate::domain::{ScoredRow, ScoringConfig};

use super::charts::RenderedChart;
use super::format::{fmt_opt, label_str};
use super::{latest_scored, recent_rows};

/// Render the daily report. Chart images are linked by file name, so the report
/// must sit next to them.
pub fn render_markdown(
    rows: &[ScoredRow],
    report_date: NaiveDate,
    charts: &[RenderedChart],
    scoring: &ScoringConfig,
    table_days: usize,
) -> String {
    let window_days = scoring.window_days;
    let mut out = String::new();

    out.push_str(&format!("# GB gas system tightness: {report_date}\n\n"));

    out.push_str("## Headline\n\n");
    match latest_scored(rows) {
        Some(latest) => {
            out.push_str(&format!(
                "- Latest scored gas day: **{}**\n",
                latest.gas_day().format("%Y-%m-%d")
            ));
            out.push_str(&format!(
                "- Tightness score: **{}** ({})\n",
                fmt_opt(latest.tightness_score, 2),
                label_str(latest.label)
            ));
            out.push_str(&format!(
                "- Linepack: {} mcm (deviation vs {window_days}-day normal: {})\n",
                fmt_opt(latest.row.linepack, 1),
                fmt_opt(latest.linepack_dev, 2)
            ));
        }
        None => {
            out.push_str(&format!(
                "- No day in this panel has a tightness score. Scores need a full \
                 {window_days}-day history with non-zero demand and varying linepack.\n"
            ));
        }
    }
    out.push('\n');

    out.push_str("## Charts\n\n");
    for chart in charts {
        out.push_str(&format!("![{}]({})\n\n", chart.kind.alt_text(), chart.file_name));
    }

    out.push_str(&format!("## Last {table_days} days\n\n"));
    out.push_str("| gas day | imbalance | imbalance_norm | linepack_dev | score | label |\n");
    out.push_str("|---|---:|---:|---:|---:|---|\n");
    for r in recent_rows(rows, table_days) {
        out.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} |\n",
            r.gas_day().format("%Y-%m-%d"),
            fmt_opt(r.imbalance, 1),
            fmt_opt(r.imbalance_norm, 2),
            fmt_opt(r.linepack_dev, 2),
            fmt_opt(r.tightness_score, 2),
            label_str(r.label),
        ));
    }
    out.push('\n');

    out.push_str(&format!(
        "Score = {} x imbalance_norm + {} x linepack_dev, labelled long/short beyond +/-{}. \
         Normalisation uses the {window_days} prior days only.\n",
        scoring.imbalance_weight, scoring.linepack_weight, scoring.threshold
    ));

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PanelRow, TightnessLabel};
    use crate::report::ChartKind;

    fn charts(date: NaiveDate) -> Vec<RenderedChart> {
        ChartKind::ALL
            .iter()
            .map(|&kind| RenderedChart {
                kind,
                file_name: kind.file_name(date),
                svg: String::new(),
            })
            .collect()
    }

    fn row(d: u32) -> ScoredRow {
        ScoredRow::unscored(PanelRow {
            gas_day: NaiveDate::from_ymd_opt(2025, 2, d).unwrap(),
            forecast_demand: Some(250.0),
            actual_demand: Some(245.0),
            linepack: Some(340.0),
        })
    }

    #[test]
    fn links_charts_and_fills_table() {
        let date = NaiveDate::from_ymd_opt(2025, 2, 10).unwrap();
        let mut rows: Vec<_> = (1..=10).map(row).collect();
        rows[9].imbalance = Some(5.0);
        rows[9].tightness_score = Some(-0.6);
        rows[9].label = Some(TightnessLabel::Short);

        let md = render_markdown(&rows, date, &charts(date), &ScoringConfig::default(), 7);

        assert!(md.contains("](demand_20250210.svg)"));
        assert!(md.contains("](imbalance_and_score_20250210.svg)"));
        assert!(md.contains("](linepack_20250210.svg)"));
        assert!(md.contains("Latest scored gas day: **2025-02-10**"));
        assert!(md.contains("| 2025-02-10 | 5.0 |  |  | -0.60 | short |"));
        assert_eq!(md.lines().filter(|l| l.starts_with("| 2025-")).count(), 7);
        assert!(md.contains("Score = 0.7 x imbalance_norm + 0.3 x linepack_dev"));
    }

    #[test]
    fn unscored_panel_says_so_with_blank_cells() {
        let date = NaiveDate::from_ymd_opt(2025, 2, 10).unwrap();
        let rows: Vec<_> = (1..=10).map(row).collect();
        let md = render_markdown(&rows, date, &charts(date), &ScoringConfig::default(), 7);

        assert!(md.contains("No day in this panel has a tightness score"));
        assert!(md.contains("| 2025-02-04 |  |  |  |  |  |"));
    }
}
