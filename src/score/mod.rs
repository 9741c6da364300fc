//! Tightness scoring.
//!
//! Per gas day:
//!
//! ```text
//! imbalance       = forecast_demand - actual_demand
//! imbalance_norm  = imbalance / mean(actual_demand over prior W days)
//! linepack_dev    = (linepack - mean(linepack, W)) / std(linepack, W)
//! tightness_score = w_imb * imbalance_norm + w_lp * linepack_dev
//! ```
//!
//! Every step propagates `None`. Insufficient history, a zero denominator or a
//! missing input all leave the affected fields (and the score) empty. Nothing is
//! coerced to zero.

use crate::domain::{Panel, ScoredRow, ScoringConfig, TightnessLabel};
use crate::math::{TrailingStats, trailing_stats};

/// Denominators at or below this (relative to the level) count as zero.
const DEGENERATE_EPS: f64 = 1e-12;

/// Score every row of the panel.
pub fn score_panel(panel: &Panel, config: &ScoringConfig) -> Vec<ScoredRow> {
    let rows = panel.rows();
    let days: Vec<_> = rows.iter().map(|r| r.gas_day).collect();
    let actual: Vec<_> = rows.iter().map(|r| r.actual_demand).collect();
    let linepack: Vec<_> = rows.iter().map(|r| r.linepack).collect();

    let demand_stats = trailing_stats(&days, &actual, config.window_days);
    let linepack_stats = trailing_stats(&days, &linepack, config.window_days);

    rows.iter()
        .zip(demand_stats)
        .zip(linepack_stats)
        .map(|((row, demand), lp)| {
            let imbalance = match (row.forecast_demand, row.actual_demand) {
                (Some(f), Some(a)) => Some(f - a),
                _ => None,
            };

            let imbalance_norm = imbalance
                .zip(demand.and_then(usable_mean))
                .map(|(imb, m)| clip(imb / m, config.clip));

            let linepack_dev = row
                .linepack
                .zip(lp.and_then(usable_std))
                .map(|(value, (m, s))| clip((value - m) / s, config.clip));

            let tightness_score = imbalance_norm
                .zip(linepack_dev)
                .map(|(imb, dev)| config.imbalance_weight * imb + config.linepack_weight * dev);

            ScoredRow {
                row: *row,
                imbalance,
                imbalance_norm,
                linepack_dev,
                tightness_score,
                label: tightness_score.map(|s| label_for(s, config.threshold)),
                demand_roll_mean: demand.map(|s| s.mean),
                linepack_roll_mean: lp.map(|s| s.mean),
            }
        })
        .collect()
}

/// Map a score to a label. Ties at `±threshold` take the non-neutral side.
pub fn label_for(score: f64, threshold: f64) -> TightnessLabel {
    if score >= threshold {
        TightnessLabel::Long
    } else if score <= -threshold {
        TightnessLabel::Short
    } else {
        TightnessLabel::Neutral
    }
}

fn usable_mean(stats: TrailingStats) -> Option<f64> {
    (stats.mean.is_finite() && stats.mean.abs() > DEGENERATE_EPS).then_some(stats.mean)
}

fn usable_std(stats: TrailingStats) -> Option<(f64, f64)> {
    let floor = DEGENERATE_EPS * stats.mean.abs().max(1.0);
    (stats.std.is_finite() && stats.std > floor).then_some((stats.mean, stats.std))
}

fn clip(value: f64, limit: Option<f64>) -> f64 {
    match limit {
        Some(l) => value.clamp(-l, l),
        None => value,
    }
}
