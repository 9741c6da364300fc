//! Processed panel file (CSV, one row per gas day).
//!
//! The file is meant to be easy to consume in spreadsheets or downstream scripts.
//! Missing values are empty cells; floats are written with full round-trip
//! precision.

use std::fs::{self, File};
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{Panel, PanelRow, ScoredRow, TightnessLabel};
use crate::error::AppError;

#[derive(Debug, Serialize, Deserialize)]
struct PanelRecord {
    gas_day: NaiveDate,
    forecast_demand: Option<f64>,
    actual_demand: Option<f64>,
    linepack: Option<f64>,
    imbalance: Option<f64>,
    imbalance_norm: Option<f64>,
    linepack_dev: Option<f64>,
    tightness_score: Option<f64>,
    tightness_label: Option<TightnessLabel>,
    demand_roll_mean: Option<f64>,
    linepack_roll_mean: Option<f64>,
}

impl From<&ScoredRow> for PanelRecord {
    fn from(r: &ScoredRow) -> Self {
        Self {
            gas_day: r.row.gas_day,
            forecast_demand: r.row.forecast_demand,
            actual_demand: r.row.actual_demand,
            linepack: r.row.linepack,
            imbalance: r.imbalance,
            imbalance_norm: r.imbalance_norm,
            linepack_dev: r.linepack_dev,
            tightness_score: r.tightness_score,
            tightness_label: r.label,
            demand_roll_mean: r.demand_roll_mean,
            linepack_roll_mean: r.linepack_roll_mean,
        }
    }
}

impl From<PanelRecord> for ScoredRow {
    fn from(r: PanelRecord) -> Self {
        ScoredRow {
            row: PanelRow {
                gas_day: r.gas_day,
                forecast_demand: r.forecast_demand,
                actual_demand: r.actual_demand,
                linepack: r.linepack,
            },
            imbalance: r.imbalance,
            imbalance_norm: r.imbalance_norm,
            linepack_dev: r.linepack_dev,
            tightness_score: r.tightness_score,
            label: r.tightness_label,
            demand_roll_mean: r.demand_roll_mean,
            linepack_roll_mean: r.linepack_roll_mean,
        }
    }
}

/// Write the scored panel to `path`, creating parent directories.
pub fn write_scored_panel_csv(path: &Path, rows: &[ScoredRow]) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| AppError::io(format!("Failed to create directory '{}': {e}", parent.display())))?;
    }

    let file = File::create(path)
        .map_err(|e| AppError::io(format!("Failed to create panel CSV '{}': {e}", path.display())))?;
    let mut writer = csv::Writer::from_writer(file);

    for row in rows {
        writer
            .serialize(PanelRecord::from(row))
            .map_err(|e| AppError::io(format!("Failed to write panel CSV row: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::io(format!("Failed to flush panel CSV: {e}")))?;

    Ok(())
}

/// Read a scored panel back. Rows come back sorted by day; duplicate days are an
/// error.
pub fn read_scored_panel_csv(path: &Path) -> Result<Vec<ScoredRow>, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::io(format!("Failed to open panel CSV '{}': {e}", path.display())))?;
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(file);

    let mut rows = Vec::new();
    for (idx, result) in reader.deserialize::<PanelRecord>().enumerate() {
        let record = result
            .map_err(|e| AppError::invalid_data(format!("Invalid panel CSV row {}: {e}", idx + 2)))?;
        rows.push(ScoredRow::from(record));
    }

    // Same uniqueness rule as a freshly built panel.
    Panel::from_rows(rows.iter().map(|r| r.row).collect())?;
    rows.sort_by_key(|r| r.row.gas_day);

    Ok(rows)
}
