//! Shared domain types.
//!
//! These types are intentionally kept lightweight so they can be:
//!
//! - used in-memory while building and scoring the panel
//! - exported to the processed panel CSV
//! - reloaded later for the `show` command
//!
//! "No data" is always `Option::None`. A zero is a real observation.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{Days, NaiveDate, NaiveDateTime};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Day-ahead demand forecast (13:00 publication).
pub const DEFAULT_FORECAST_ID: &str = "PUBOB39";
/// Actual NTS demand.
pub const DEFAULT_ACTUAL_ID: &str = "PUBOB637";
/// Linepack, hourly actual, aggregate, D+1.
pub const DEFAULT_LINEPACK_ID: &str = "PUBOBJ486";

/// A single reading of a published series.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    /// Gas day the value applies to.
    pub gas_day: NaiveDate,
    /// When the value was published.
    pub timestamp: NaiveDateTime,
    pub value: f64,
}

/// How sub-daily observations collapse to one value per gas day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    /// Arithmetic mean of every value published for the day.
    Mean,
    /// The value with the latest publication timestamp.
    Last,
}

/// Panel columns backed by a published series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SeriesColumn {
    ForecastDemand,
    ActualDemand,
    Linepack,
}

impl SeriesColumn {
    pub const ALL: [SeriesColumn; 3] = [
        SeriesColumn::ForecastDemand,
        SeriesColumn::ActualDemand,
        SeriesColumn::Linepack,
    ];

    pub fn column_name(self) -> &'static str {
        match self {
            SeriesColumn::ForecastDemand => "forecast_demand",
            SeriesColumn::ActualDemand => "actual_demand",
            SeriesColumn::Linepack => "linepack",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            SeriesColumn::ForecastDemand => "Demand forecast",
            SeriesColumn::ActualDemand => "Demand outturn",
            SeriesColumn::Linepack => "Linepack",
        }
    }

    /// Linepack is a level sampled through the day, so it is averaged. Demand
    /// publications are revised, so the latest one wins.
    pub fn default_aggregation(self) -> Aggregation {
        match self {
            SeriesColumn::Linepack => Aggregation::Mean,
            SeriesColumn::ForecastDemand | SeriesColumn::ActualDemand => Aggregation::Last,
        }
    }
}

/// One series to fetch, where it lands in the panel, and how it is aggregated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesSpec {
    pub column: SeriesColumn,
    pub publication_id: String,
    pub aggregation: Aggregation,
}

impl SeriesSpec {
    pub fn new(column: SeriesColumn, publication_id: impl Into<String>) -> Self {
        Self {
            column,
            publication_id: publication_id.into(),
            aggregation: column.default_aggregation(),
        }
    }

    pub fn with_aggregation(mut self, aggregation: Aggregation) -> Self {
        self.aggregation = aggregation;
        self
    }

    /// The three series the report is built from.
    pub fn default_set() -> Vec<SeriesSpec> {
        vec![
            SeriesSpec::new(SeriesColumn::ForecastDemand, DEFAULT_FORECAST_ID),
            SeriesSpec::new(SeriesColumn::ActualDemand, DEFAULT_ACTUAL_ID),
            SeriesSpec::new(SeriesColumn::Linepack, DEFAULT_LINEPACK_ID),
        ]
    }
}

/// One aggregated value per gas day.
pub type DailySeries = BTreeMap<NaiveDate, f64>;

/// One gas day of the joined panel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelRow {
    pub gas_day: NaiveDate,
    pub forecast_demand: Option<f64>,
    pub actual_demand: Option<f64>,
    pub linepack: Option<f64>,
}

impl PanelRow {
    pub fn empty(gas_day: NaiveDate) -> Self {
        Self {
            gas_day,
            forecast_demand: None,
            actual_demand: None,
            linepack: None,
        }
    }

    pub fn get(&self, column: SeriesColumn) -> Option<f64> {
        match column {
            SeriesColumn::ForecastDemand => self.forecast_demand,
            SeriesColumn::ActualDemand => self.actual_demand,
            SeriesColumn::Linepack => self.linepack,
        }
    }

    pub fn set(&mut self, column: SeriesColumn, value: Option<f64>) {
        match column {
            SeriesColumn::ForecastDemand => self.forecast_demand = value,
            SeriesColumn::ActualDemand => self.actual_demand = value,
            SeriesColumn::Linepack => self.linepack = value,
        }
    }
}

/// Daily panel keyed by gas day.
///
/// Invariant: rows are sorted ascending by `gas_day` and day keys are unique.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Panel {
    rows: Vec<PanelRow>,
}

impl Panel {
    /// Build a panel from rows in any order. Duplicate day keys are rejected.
    pub fn from_rows(mut rows: Vec<PanelRow>) -> Result<Self, AppError> {
        rows.sort_by_key(|r| r.gas_day);
        if let Some(pair) = rows.windows(2).find(|w| w[0].gas_day == w[1].gas_day) {
            return Err(AppError::invalid_data(format!(
                "Duplicate gas day {} in panel.",
                pair[0].gas_day
            )));
        }
        Ok(Self { rows })
    }

    /// Rows from a day-keyed map, which is already unique and ordered.
    pub fn from_day_map(rows: BTreeMap<NaiveDate, PanelRow>) -> Self {
        Self {
            rows: rows.into_values().collect(),
        }
    }

    pub fn rows(&self) -> &[PanelRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn first_day(&self) -> Option<NaiveDate> {
        self.rows.first().map(|r| r.gas_day)
    }

    pub fn last_day(&self) -> Option<NaiveDate> {
        self.rows.last().map(|r| r.gas_day)
    }

    /// Days that carry a value for `column`.
    pub fn coverage(&self, column: SeriesColumn) -> usize {
        self.rows.iter().filter(|r| r.get(column).is_some()).count()
    }
}

/// Discrete system-balance call derived from the tightness score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TightnessLabel {
    Long,
    Neutral,
    Short,
}

impl TightnessLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            TightnessLabel::Long => "long",
            TightnessLabel::Neutral => "neutral",
            TightnessLabel::Short => "short",
        }
    }
}

impl std::fmt::Display for TightnessLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A panel row plus the derived tightness metrics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredRow {
    pub row: PanelRow,
    /// `forecast_demand - actual_demand`; positive means the system ran long.
    pub imbalance: Option<f64>,
    pub imbalance_norm: Option<f64>,
    /// Linepack z-score against the trailing window.
    pub linepack_dev: Option<f64>,
    pub tightness_score: Option<f64>,
    pub label: Option<TightnessLabel>,
    /// Trailing mean of actual demand over the prior window.
    pub demand_roll_mean: Option<f64>,
    /// Trailing mean of linepack over the prior window.
    pub linepack_roll_mean: Option<f64>,
}

impl ScoredRow {
    /// A row with no derived metrics yet.
    pub fn unscored(row: PanelRow) -> Self {
        Self {
            row,
            imbalance: None,
            imbalance_norm: None,
            linepack_dev: None,
            tightness_score: None,
            label: None,
            demand_roll_mean: None,
            linepack_roll_mean: None,
        }
    }

    pub fn gas_day(&self) -> NaiveDate {
        self.row.gas_day
    }
}

/// Tightness scoring parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringConfig {
    /// Trailing window length in days.
    pub window_days: usize,
    /// `|score| >= threshold` gives a long/short label.
    pub threshold: f64,
    /// Symmetric clip applied to `imbalance_norm` and `linepack_dev`.
    pub clip: Option<f64>,
    pub imbalance_weight: f64,
    pub linepack_weight: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            window_days: 14,
            threshold: 0.5,
            clip: Some(5.0),
            imbalance_weight: 0.7,
            linepack_weight: 0.3,
        }
    }
}

impl ScoringConfig {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.window_days < 2 {
            return Err(AppError::config("Rolling window must be at least 2 days."));
        }
        if !(self.threshold.is_finite() && self.threshold >= 0.0) {
            return Err(AppError::config("Threshold must be a finite, non-negative number."));
        }
        if let Some(clip) = self.clip {
            if !(clip.is_finite() && clip > 0.0) {
                return Err(AppError::config("Clip must be a finite, positive number."));
            }
        }
        if !(self.imbalance_weight.is_finite() && self.linepack_weight.is_finite()) {
            return Err(AppError::config("Score weights must be finite."));
        }
        Ok(())
    }
}

/// Raw response cache settings.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheSettings {
    pub dir: PathBuf,
    /// When false the cache is neither read nor written.
    pub enabled: bool,
    /// Skip cache reads (responses are still stored).
    pub refresh: bool,
}

/// Where run artifacts go.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputSettings {
    pub panel_path: PathBuf,
    pub reports_dir: PathBuf,
    /// Rows in the recent-days table.
    pub table_days: usize,
}

/// A full report run's configuration.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone, PartialEq)]
pub struct ReportConfig {
    /// Last gas day pulled (inclusive); also the report as-of date.
    pub end_date: NaiveDate,
    /// Number of trailing gas days to pull, including `end_date`.
    pub lookback_days: usize,
    pub series: Vec<SeriesSpec>,
    pub scoring: ScoringConfig,
    pub cache: CacheSettings,
    pub output: OutputSettings,
}

impl ReportConfig {
    /// First gas day pulled (inclusive).
    pub fn start_date(&self) -> NaiveDate {
        let back = self.lookback_days.saturating_sub(1) as u64;
        self.end_date
            .checked_sub_days(Days::new(back))
            .unwrap_or(NaiveDate::MIN)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.lookback_days == 0 {
            return Err(AppError::config("Lookback must be at least 1 day."));
        }
        if self.series.is_empty() {
            return Err(AppError::config("No series configured."));
        }
        if self.output.table_days == 0 {
            return Err(AppError::config("Table must show at least 1 day."));
        }
        self.scoring.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    #[test]
    fn panel_sorts_rows_by_day() {
        let panel = Panel::from_rows(vec![
            PanelRow::empty(day(3)),
            PanelRow::empty(day(1)),
            PanelRow::empty(day(2)),
        ])
        .unwrap();
        let days: Vec<_> = panel.rows().iter().map(|r| r.gas_day).collect();
        assert_eq!(days, vec![day(1), day(2), day(3)]);
        assert_eq!(panel.first_day(), Some(day(1)));
        assert_eq!(panel.last_day(), Some(day(3)));
    }

    #[test]
    fn panel_rejects_duplicate_days() {
        let err = Panel::from_rows(vec![PanelRow::empty(day(2)), PanelRow::empty(day(2))]).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::InvalidData);
    }

    #[test]
    fn coverage_counts_present_values_per_column() {
        let mut second = PanelRow::empty(day(2));
        second.set(SeriesColumn::Linepack, Some(340.0));
        second.set(SeriesColumn::ActualDemand, Some(0.0));
        let panel = Panel::from_rows(vec![PanelRow::empty(day(1)), second]).unwrap();

        let counts: Vec<_> = SeriesColumn::ALL.iter().map(|&c| panel.coverage(c)).collect();
        assert_eq!(counts, vec![0, 1, 1]);
    }

    #[test]
    fn default_aggregation_is_explicit_per_series() {
        let specs = SeriesSpec::default_set();
        let policy = |col: SeriesColumn| specs.iter().find(|s| s.column == col).unwrap().aggregation;
        assert_eq!(policy(SeriesColumn::ForecastDemand), Aggregation::Last);
        assert_eq!(policy(SeriesColumn::ActualDemand), Aggregation::Last);
        assert_eq!(policy(SeriesColumn::Linepack), Aggregation::Mean);
    }

    #[test]
    fn start_date_covers_lookback_inclusive() {
        let config = ReportConfig {
            end_date: day(21),
            lookback_days: 21,
            series: SeriesSpec::default_set(),
            scoring: ScoringConfig::default(),
            cache: CacheSettings {
                dir: PathBuf::from("data/raw"),
                enabled: true,
                refresh: false,
            },
            output: OutputSettings {
                panel_path: PathBuf::from("data/processed/daily_panel.csv"),
                reports_dir: PathBuf::from("reports"),
                table_days: 7,
            },
        };
        assert_eq!(config.start_date(), day(1));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn scoring_config_rejects_tiny_window() {
        let config = ScoringConfig {
            window_days: 1,
            ..ScoringConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
