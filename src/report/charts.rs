//! SVG charts for the report.
//!
//! Why SVG?
//! - the Markdown report embeds them directly
//! - Plotters' SVG backend writes text as `<text>` elements, so no system font
//!   stack is needed at build or run time
//!
//! The x axis is the row index; tick labels map back to gas days. Missing values
//! break a line instead of being drawn as zero.

use std::error::Error;

use chrono::NaiveDate;
use plotters::coord::Shift;
use plotters::coord::cartesian::Cartesian2d;
use plotters::coord::types::RangedCoordf64;
use plotters::prelude::*;

use crate::domain::{ScoredRow, ScoringConfig};
use crate::error::AppError;

const WIDTH: u32 = 960;
const HEIGHT: u32 = 480;

type Chart2d<'a, 'b> = ChartContext<'a, SVGBackend<'b>, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Demand,
    ImbalanceAndScore,
    Linepack,
}

impl ChartKind {
    pub const ALL: [ChartKind; 3] = [ChartKind::Demand, ChartKind::ImbalanceAndScore, ChartKind::Linepack];

    pub fn file_stem(self) -> &'static str {
        match self {
            ChartKind::Demand => "demand",
            ChartKind::ImbalanceAndScore => "imbalance_and_score",
            ChartKind::Linepack => "linepack",
        }
    }

    pub fn alt_text(self) -> &'static str {
        match self {
            ChartKind::Demand => "Demand forecast vs outturn",
            ChartKind::ImbalanceAndScore => "Imbalance and tightness score",
            ChartKind::Linepack => "Linepack vs recent normal",
        }
    }

    /// Name used in render-failure messages.
    pub fn stage(self) -> &'static str {
        match self {
            ChartKind::Demand => "demand chart",
            ChartKind::ImbalanceAndScore => "imbalance chart",
            ChartKind::Linepack => "linepack chart",
        }
    }

    pub fn file_name(self, report_date: NaiveDate) -> String {
        format!("{}_{}.svg", self.file_stem(), report_date.format("%Y%m%d"))
    }
}

/// A chart rendered in memory, ready to be written.
#[derive(Debug, Clone)]
pub struct RenderedChart {
    pub kind: ChartKind,
    pub file_name: String,
    pub svg: String,
}

/// Render all report charts.
pub fn render_charts(
    rows: &[ScoredRow],
    report_date: NaiveDate,
    scoring: &ScoringConfig,
) -> Result<Vec<RenderedChart>, AppError> {
    ChartKind::ALL
        .iter()
        .map(|&kind| {
            let svg = render_svg(kind, |root| match kind {
                ChartKind::Demand => draw_demand(root, rows, report_date),
                ChartKind::ImbalanceAndScore => draw_imbalance(root, rows, scoring.threshold),
                ChartKind::Linepack => draw_linepack(root, rows, scoring.window_days),
            })?;
            Ok(RenderedChart {
                kind,
                file_name: kind.file_name(report_date),
                svg,
            })
        })
        .collect()
}

fn render_svg<F>(kind: ChartKind, draw: F) -> Result<String, AppError>
where
    F: FnOnce(&DrawingArea<SVGBackend<'_>, Shift>) -> Result<(), Box<dyn Error>>,
{
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&WHITE)
            .map_err(|e| AppError::render_failure(kind.stage(), e))?;
        draw(&root).map_err(|e| AppError::render_failure(kind.stage(), e))?;
        root.present()
            .map_err(|e| AppError::render_failure(kind.stage(), e))?;
    }
    Ok(svg)
}

fn draw_demand(
    root: &DrawingArea<SVGBackend<'_>, Shift>,
    rows: &[ScoredRow],
    report_date: NaiveDate,
) -> Result<(), Box<dyn Error>> {
    let forecast = indexed(rows, |r| r.row.forecast_demand);
    let actual = indexed(rows, |r| r.row.actual_demand);
    let (y0, y1) = value_range(present(&forecast).chain(present(&actual)));

    let mut chart = ChartBuilder::on(root)
        .caption(
            format!("Demand forecast vs outturn (up to {})", report_date.format("%Y-%m-%d")),
            ("sans-serif", 20),
        )
        .margin(12)
        .set_label_area_size(LabelAreaPosition::Left, 60)
        .set_label_area_size(LabelAreaPosition::Bottom, 40)
        .build_cartesian_2d(x_range(rows.len()), y0..y1)?;

    chart
        .configure_mesh()
        .x_labels(7)
        .x_label_formatter(&|v| day_label(rows, *v))
        .x_desc("Gas day")
        .y_desc("Demand (mcm/d)")
        .draw()?;

    draw_line(&mut chart, &forecast, BLUE, "Forecast")?;
    draw_line(&mut chart, &actual, RED, "Outturn")?;

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    Ok(())
}

fn draw_imbalance(
    root: &DrawingArea<SVGBackend<'_>, Shift>,
    rows: &[ScoredRow],
    threshold: f64,
) -> Result<(), Box<dyn Error>> {
    // Only days where both series exist, as in the score's own definition.
    let both: Vec<(f64, f64, f64)> = rows
        .iter()
        .enumerate()
        .filter_map(|(i, r)| Some((i as f64, r.imbalance?, r.tightness_score?)))
        .collect();
    let imbalance: Vec<(f64, Option<f64>)> = both.iter().map(|&(x, imb, _)| (x, Some(imb))).collect();
    let score: Vec<(f64, Option<f64>)> = both.iter().map(|&(x, _, s)| (x, Some(s))).collect();

    let (y0, y1) = value_range(present(&imbalance));
    let (s0, s1) = value_range(present(&score).chain([threshold, -threshold]));
    let xs = x_range(rows.len());

    let mut chart = ChartBuilder::on(root)
        .caption("Imbalance and tightness score", ("sans-serif", 20))
        .margin(12)
        .set_label_area_size(LabelAreaPosition::Left, 60)
        .set_label_area_size(LabelAreaPosition::Right, 60)
        .set_label_area_size(LabelAreaPosition::Bottom, 40)
        .build_cartesian_2d(xs.clone(), y0..y1)?
        .set_secondary_coord(xs.clone(), s0..s1);

    chart
        .configure_mesh()
        .x_labels(7)
        .x_label_formatter(&|v| day_label(rows, *v))
        .x_desc("Gas day")
        .y_desc("Imbalance (mcm/d)")
        .draw()?;
    chart
        .configure_secondary_axes()
        .y_desc("Tightness score")
        .draw()?;

    draw_line(&mut chart, &imbalance, BLUE, "Imbalance (forecast - actual)")?;

    let score_style = RGBColor(230, 120, 0).stroke_width(2);
    chart
        .draw_secondary_series(LineSeries::new(Vec::<(f64, f64)>::new(), score_style))?
        .label("Tightness score")
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], score_style));
    for segment in segments(&score) {
        chart.draw_secondary_series(LineSeries::new(segment, score_style))?;
    }

    let guide = RGBColor(150, 150, 150).stroke_width(1);
    for level in [threshold, -threshold] {
        chart.draw_secondary_series(LineSeries::new(vec![(xs.start, level), (xs.end, level)], guide))?;
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    Ok(())
}

fn draw_linepack(
    root: &DrawingArea<SVGBackend<'_>, Shift>,
    rows: &[ScoredRow],
    window_days: usize,
) -> Result<(), Box<dyn Error>> {
    let linepack = indexed(rows, |r| r.row.linepack);
    let normal = indexed(rows, |r| r.linepack_roll_mean);
    let (y0, y1) = value_range(present(&linepack).chain(present(&normal)));

    let mut chart = ChartBuilder::on(root)
        .caption("System linepack vs recent normal", ("sans-serif", 20))
        .margin(12)
        .set_label_area_size(LabelAreaPosition::Left, 60)
        .set_label_area_size(LabelAreaPosition::Bottom, 40)
        .build_cartesian_2d(x_range(rows.len()), y0..y1)?;

    chart
        .configure_mesh()
        .x_labels(7)
        .x_label_formatter(&|v| day_label(rows, *v))
        .x_desc("Gas day")
        .y_desc("Linepack (mcm)")
        .draw()?;

    draw_line(&mut chart, &linepack, BLUE, "Linepack")?;
    draw_line(&mut chart, &normal, RGBColor(120, 120, 120), &format!("{window_days}-day mean"))?;

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    Ok(())
}

/// Draw a labelled line, broken wherever the value is missing. Isolated points
/// get a dot so they stay visible.
fn draw_line(
    chart: &mut Chart2d<'_, '_>,
    points: &[(f64, Option<f64>)],
    color: RGBColor,
    label: &str,
) -> Result<(), Box<dyn Error>> {
    let style = color.stroke_width(2);
    chart
        .draw_series(LineSeries::new(Vec::<(f64, f64)>::new(), style))?
        .label(label)
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], style));

    for segment in segments(points) {
        if segment.len() == 1 {
            chart.draw_series(segment.iter().map(|&p| Circle::new(p, 3, style.filled())))?;
        } else {
            chart.draw_series(LineSeries::new(segment, style))?;
        }
    }
    Ok(())
}

fn indexed(rows: &[ScoredRow], f: impl Fn(&ScoredRow) -> Option<f64>) -> Vec<(f64, Option<f64>)> {
    rows.iter().enumerate().map(|(i, r)| (i as f64, f(r))).collect()
}

fn present(points: &[(f64, Option<f64>)]) -> impl Iterator<Item = f64> + '_ {
    points.iter().filter_map(|(_, v)| *v)
}

/// Split into runs of consecutive present values.
fn segments(points: &[(f64, Option<f64>)]) -> Vec<Vec<(f64, f64)>> {
    let mut out = Vec::new();
    let mut current: Vec<(f64, f64)> = Vec::new();
    let mut last_x: Option<f64> = None;

    for &(x, v) in points {
        match v.filter(|v| v.is_finite()) {
            Some(y) => {
                let contiguous = last_x.is_some_and(|lx| (x - lx - 1.0).abs() < 1e-9);
                if !contiguous && !current.is_empty() {
                    out.push(std::mem::take(&mut current));
                }
                current.push((x, y));
                last_x = Some(x);
            }
            None => {
                if !current.is_empty() {
                    out.push(std::mem::take(&mut current));
                }
                last_x = None;
            }
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

fn x_range(n: usize) -> std::ops::Range<f64> {
    let last = n.saturating_sub(1) as f64;
    -0.5..last + 0.5
}

/// Padded min/max of finite values; a unit range when there is nothing to plot.
fn value_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (mut lo, mut hi) = (f64::INFINITY, f64::NEG_INFINITY);
    for v in values.filter(|v| v.is_finite()) {
        lo = lo.min(v);
        hi = hi.max(v);
    }
    if !lo.is_finite() || !hi.is_finite() {
        return (0.0, 1.0);
    }
    if (hi - lo).abs() < 1e-9 {
        let pad = (lo.abs() * 0.05).max(1.0);
        return (lo - pad, hi + pad);
    }
    let pad = (hi - lo) * 0.05;
    (lo - pad, hi + pad)
}

fn day_label(rows: &[ScoredRow], v: f64) -> String {
    let i = v.round();
    if (v - i).abs() > 1e-6 || i < 0.0 {
        return String::new();
    }
    rows.get(i as usize)
        .map(|r| r.gas_day().format("%d-%b").to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PanelRow;

    fn rows(n: u64, linepack: impl Fn(u64) -> Option<f64>) -> Vec<ScoredRow> {
        (0..n)
            .map(|i| {
                let day = NaiveDate::from_ymd_opt(2025, 1, 1)
                    .unwrap()
                    .checked_add_days(chrono::Days::new(i))
                    .unwrap();
                ScoredRow {
                    imbalance: Some(i as f64 - 3.0),
                    tightness_score: if i % 2 == 0 { Some(0.1 * i as f64) } else { None },
                    ..ScoredRow::unscored(PanelRow {
                        gas_day: day,
                        forecast_demand: Some(250.0 + i as f64),
                        actual_demand: Some(248.0),
                        linepack: linepack(i),
                    })
                }
            })
            .collect()
    }

    #[test]
    fn segments_break_on_gaps() {
        let pts = vec![(0.0, Some(1.0)), (1.0, Some(2.0)), (2.0, None), (3.0, Some(4.0))];
        let segs = segments(&pts);
        assert_eq!(segs, vec![vec![(0.0, 1.0), (1.0, 2.0)], vec![(3.0, 4.0)]]);

        // Non-adjacent indices (filtered input) also break.
        let pts = vec![(0.0, Some(1.0)), (2.0, Some(2.0))];
        assert_eq!(segments(&pts).len(), 2);
    }

    #[test]
    fn value_range_handles_flat_and_empty() {
        assert_eq!(value_range(std::iter::empty()), (0.0, 1.0));
        let (lo, hi) = value_range([340.0, 340.0].into_iter());
        assert!(lo < 340.0 && hi > 340.0);
    }

    #[test]
    fn renders_three_svg_charts() {
        let rows = rows(10, |i| Some(340.0 + i as f64));
        let date = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
        let charts = render_charts(&rows, date, &ScoringConfig::default()).unwrap();

        assert_eq!(charts.len(), 3);
        assert_eq!(charts[0].file_name, "demand_20250110.svg");
        assert_eq!(charts[1].file_name, "imbalance_and_score_20250110.svg");
        assert_eq!(charts[2].file_name, "linepack_20250110.svg");
        assert!(charts.iter().all(|c| c.svg.contains("<svg")));
    }

    #[test]
    fn renders_when_nothing_is_plottable() {
        let rows: Vec<_> = rows(5, |_| None)
            .into_iter()
            .map(|r| ScoredRow {
                imbalance: None,
                tightness_score: None,
                ..r
            })
            .collect();
        let date = NaiveDate::from_ymd_opt(2025, 1, 5).unwrap();
        assert!(render_charts(&rows, date, &ScoringConfig::default()).is_ok());
    }
}
