//! Trailing-window statistics over a daily series.
//!
//! The window for day `d` is the `W` calendar days `[d - W, d - 1]`. Day `d`
//! itself never contributes. A statistic is only produced when every one of
//! those `W` days carries a value (full-window policy); anything less yields
//! `None` rather than a partial estimate.

use chrono::{Days, NaiveDate};

/// Mean and sample standard deviation of one trailing window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrailingStats {
    pub mean: f64,
    /// Sample std (n-1 denominator).
    pub std: f64,
}

/// Compute trailing stats for every position of a day-sorted series.
///
/// `days` must be ascending and unique, with `values[i]` belonging to `days[i]`.
pub fn trailing_stats(days: &[NaiveDate], values: &[Option<f64>], window_days: usize) -> Vec<Option<TrailingStats>> {
    debug_assert_eq!(days.len(), values.len());

    let mut out = Vec::with_capacity(days.len());
    let mut window = Vec::with_capacity(window_days.min(days.len()));

    for (i, day) in days.iter().enumerate() {
        if window_days == 0 {
            out.push(None);
            continue;
        }

        let lo = day
            .checked_sub_days(Days::new(window_days as u64))
            .unwrap_or(NaiveDate::MIN);
        let start = days[..i].partition_point(|d| *d < lo);

        window.clear();
        window.extend(values[start..i].iter().flatten().copied());

        if window.len() < window_days {
            out.push(None);
            continue;
        }

        out.push(Some(TrailingStats {
            mean: mean(&window),
            std: sample_std(&window),
        }));
    }

    out
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub fn sample_std(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (n as f64 - 1.0);
    variance.sqrt()
}
