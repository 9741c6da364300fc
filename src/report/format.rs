//! Terminal output for the scored panel.
//!
//! Formatting lives here so the scoring code stays free of presentation, and the
//! Markdown report reuses the same value rendering.

use crate::domain::{ScoredRow, TightnessLabel};

use super::{latest_scored, recent_rows};

/// One-line summary of the latest scored day.
pub fn format_headline(rows: &[ScoredRow]) -> String {
    let Some(latest) = latest_scored(rows) else {
        return "No scored day yet: the rolling window has not filled, or linepack/demand \
                had no usable variation."
            .to_string();
    };
    format!(
        "Latest scored gas day {}: score {} -> {} | linepack {} mcm (dev {})",
        latest.gas_day(),
        fmt_opt(latest.tightness_score, 2),
        label_str(latest.label),
        fmt_opt(latest.row.linepack, 1),
        fmt_opt(latest.linepack_dev, 2),
    )
}

/// Plain-text table of the last `days` calendar days.
pub fn format_recent_table(rows: &[ScoredRow], days: usize) -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:<10} {:>10} {:>14} {:>12} {:>8} {:<8}",
            "gas_day", "imbalance", "imbalance_norm", "linepack_dev", "score", "label"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(format!("{:-<10} {:-<10} {:-<14} {:-<12} {:-<8} {:-<8}", "", "", "", "", "", "").trim_end());
    out.push('\n');

    for r in recent_rows(rows, days) {
        out.push_str(
            format!(
                "{:<10} {:>10} {:>14} {:>12} {:>8} {:<8}",
                r.gas_day().format("%Y-%m-%d"),
                fmt_opt(r.imbalance, 1),
                fmt_opt(r.imbalance_norm, 2),
                fmt_opt(r.linepack_dev, 2),
                fmt_opt(r.tightness_score, 2),
                label_str(r.label),
            )
            .trim_end(),
        );
        out.push('\n');
    }

    out
}

/// Fixed-precision value, or an empty string when missing.
pub(crate) fn fmt_opt(v: Option<f64>, precision: usize) -> String {
    match v {
        Some(v) if v.is_finite() => format!("{v:.precision$}"),
        _ => String::new(),
    }
}

pub(crate) fn label_str(label: Option<TightnessLabel>) -> &'static str {
    label.map(TightnessLabel::as_str).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PanelRow;
    use chrono::NaiveDate;

    fn scored(d: u32, score: Option<f64>) -> ScoredRow {
        ScoredRow {
            imbalance: Some(12.345),
            tightness_score: score,
            label: score.map(|s| crate::score::label_for(s, 0.5)),
            ..ScoredRow::unscored(PanelRow {
                gas_day: NaiveDate::from_ymd_opt(2025, 3, d).unwrap(),
                forecast_demand: Some(250.0),
                actual_demand: Some(237.655),
                linepack: Some(341.26),
            })
        }
    }

    #[test]
    fn fmt_opt_blank_for_missing() {
        assert_eq!(fmt_opt(None, 2), "");
        assert_eq!(fmt_opt(Some(f64::NAN), 2), "");
        assert_eq!(fmt_opt(Some(-0.456), 2), "-0.46");
    }

    #[test]
    fn headline_reports_latest_scored_day() {
        let rows = vec![scored(1, Some(0.8)), scored(2, None)];
        let line = format_headline(&rows);
        assert!(line.contains("2025-03-01"));
        assert!(line.contains("0.80 -> long"));
        assert!(line.contains("341.3"));
    }

    #[test]
    fn headline_says_when_nothing_is_scored() {
        assert!(format_headline(&[scored(1, None)]).starts_with("No scored day yet"));
    }

    #[test]
    fn table_has_header_and_blank_cells() {
        let rows: Vec<_> = (1..=9).map(|d| scored(d, None)).collect();
        let table = format_recent_table(&rows, 7);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 2 + 7);
        assert!(lines[0].starts_with("gas_day"));
        assert!(lines[2].starts_with("2025-03-03"));
        // Only the imbalance column is filled.
        assert_eq!(lines[2].split_whitespace().count(), 2);
    }
}
