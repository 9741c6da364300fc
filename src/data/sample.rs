//! Synthetic daily panel generation.
//!
//! Produces a plausible-looking GB panel (winter-ish demand with a weekly cycle,
//! a noisy day-ahead forecast, and linepack that reacts to the forecast error) so
//! scoring and reporting can be exercised without network access. The same seed
//! always produces the same panel.

use chrono::{Datelike, Days, NaiveDate};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{Panel, PanelRow};
use crate::error::AppError;

/// Baseline NTS demand (mcm/d).
const BASE_DEMAND: f64 = 260.0;
/// Weekend demand dip (mcm/d).
const WEEKEND_DIP: f64 = 25.0;
/// Baseline linepack (mcm).
const BASE_LINEPACK: f64 = 340.0;
/// Linepack response per mcm of forecast error.
const LINEPACK_SENSITIVITY: f64 = 0.4;

#[derive(Debug, Clone, PartialEq)]
pub struct SampleConfig {
    /// Last gas day in the panel.
    pub end_date: NaiveDate,
    pub days: usize,
    pub seed: u64,
    /// Hold linepack flat (zero variance), which leaves every score undefined.
    pub constant_linepack: bool,
    /// Std dev of the forecast error (mcm/d).
    pub forecast_noise: f64,
    /// Std dev of day-to-day linepack noise (mcm).
    pub linepack_noise: f64,
}

impl SampleConfig {
    pub fn new(end_date: NaiveDate, days: usize, seed: u64) -> Self {
        Self {
            end_date,
            days,
            seed,
            constant_linepack: false,
            forecast_noise: 8.0,
            linepack_noise: 3.0,
        }
    }
}

pub fn generate_panel(config: &SampleConfig) -> Result<Panel, AppError> {
    if config.days == 0 {
        return Err(AppError::config("Sample day count must be > 0."));
    }
    if !(config.forecast_noise.is_finite() && config.forecast_noise >= 0.0)
        || !(config.linepack_noise.is_finite() && config.linepack_noise >= 0.0)
    {
        return Err(AppError::config("Invalid sample noise settings."));
    }

    let start = config
        .end_date
        .checked_sub_days(Days::new(config.days as u64 - 1))
        .ok_or_else(|| AppError::config("Sample range starts before the earliest representable date."))?;

    let mut rng = StdRng::seed_from_u64(config.seed);
    let forecast_err = Normal::new(0.0, config.forecast_noise)
        .map_err(|e| AppError::config(format!("Noise distribution error: {e}")))?;
    let lp_noise = Normal::new(0.0, config.linepack_noise)
        .map_err(|e| AppError::config(format!("Noise distribution error: {e}")))?;

    let mut rows = Vec::with_capacity(config.days);
    for i in 0..config.days {
        let gas_day = start
            .checked_add_days(Days::new(i as u64))
            .ok_or_else(|| AppError::config("Sample range overflows the calendar."))?;

        let weekend = gas_day.weekday().number_from_monday() >= 6;
        let seasonal = 20.0 * (i as f64 / 9.0).sin();
        let actual = BASE_DEMAND + seasonal - if weekend { WEEKEND_DIP } else { 0.0 };
        let forecast = actual + forecast_err.sample(&mut rng);

        // Under-forecast demand drains linepack; over-forecast builds it.
        let linepack = if config.constant_linepack {
            BASE_LINEPACK
        } else {
            BASE_LINEPACK + LINEPACK_SENSITIVITY * (forecast - actual) + lp_noise.sample(&mut rng)
        };

        rows.push(PanelRow {
            gas_day,
            forecast_demand: Some(forecast),
            actual_demand: Some(actual),
            linepack: Some(linepack),
        });
    }

    Panel::from_rows(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn end() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 31).unwrap()
    }

    #[test]
    fn same_seed_same_panel() {
        let a = generate_panel(&SampleConfig::new(end(), 30, 7)).unwrap();
        let b = generate_panel(&SampleConfig::new(end(), 30, 7)).unwrap();
        let c = generate_panel(&SampleConfig::new(end(), 30, 8)).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn panel_ends_on_requested_day() {
        let panel = generate_panel(&SampleConfig::new(end(), 30, 1)).unwrap();
        assert_eq!(panel.len(), 30);
        assert_eq!(panel.last_day(), Some(end()));
        assert_eq!(panel.first_day(), NaiveDate::from_ymd_opt(2025, 1, 2));
    }

    #[test]
    fn constant_linepack_is_flat() {
        let config = SampleConfig {
            constant_linepack: true,
            ..SampleConfig::new(end(), 10, 1)
        };
        let panel = generate_panel(&config).unwrap();
        assert!(panel.rows().iter().all(|r| r.linepack == Some(BASE_LINEPACK)));
    }

    #[test]
    fn zero_days_is_rejected() {
        assert!(generate_panel(&SampleConfig::new(end(), 0, 1)).is_err());
    }
}
