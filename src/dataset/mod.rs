//! Daily panel construction.
//!
//! fetch each series -> collapse to one value per gas day -> outer-join on day.
//!
//! A day that appears in any series gets a row; columns with nothing for that day
//! stay `None`.

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::data::SeriesSource;
use crate::domain::{Aggregation, DailySeries, Observation, Panel, PanelRow, SeriesColumn, SeriesSpec};
use crate::error::AppError;

/// Collapse observations to one value per gas day using `policy`.
///
/// For `Last`, ties on publication timestamp go to the later observation in input
/// order.
pub fn aggregate_daily(observations: &[Observation], policy: Aggregation) -> DailySeries {
    match policy {
        Aggregation::Mean => {
            let mut acc: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
            for obs in observations {
                let slot = acc.entry(obs.gas_day).or_insert((0.0, 0));
                slot.0 += obs.value;
                slot.1 += 1;
            }
            acc.into_iter()
                .map(|(day, (sum, n))| (day, sum / n as f64))
                .collect()
        }
        Aggregation::Last => {
            let mut latest: BTreeMap<NaiveDate, &Observation> = BTreeMap::new();
            for obs in observations {
                latest
                    .entry(obs.gas_day)
                    .and_modify(|cur| {
                        if obs.timestamp >= cur.timestamp {
                            *cur = obs;
                        }
                    })
                    .or_insert(obs);
            }
            latest.into_iter().map(|(day, obs)| (day, obs.value)).collect()
        }
    }
}

/// Outer-join per-column daily series into a panel.
pub fn join_series(series: &[(SeriesColumn, DailySeries)]) -> Panel {
    let mut rows: BTreeMap<NaiveDate, PanelRow> = BTreeMap::new();
    for (column, daily) in series {
        for (&day, &value) in daily {
            rows.entry(day)
                .or_insert_with(|| PanelRow::empty(day))
                .set(*column, Some(value));
        }
    }
    Panel::from_day_map(rows)
}

/// Fetch every configured series for `[start, end]` and join them into a panel.
///
/// Any fetch failure aborts the build: every configured series is required.
pub fn build_panel<S: SeriesSource>(
    source: &S,
    specs: &[SeriesSpec],
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Panel, AppError> {
    if specs.is_empty() {
        return Err(AppError::config("No series provided to build the panel from."));
    }
    let mut seen = HashSet::new();
    for spec in specs {
        if !seen.insert(spec.column) {
            return Err(AppError::config(format!(
                "Column '{}' is configured more than once.",
                spec.column.column_name()
            )));
        }
    }
    if end < start {
        return Err(AppError::config(format!("Date range {start}..{end} is empty.")));
    }

    let mut series = Vec::with_capacity(specs.len());
    for spec in specs {
        info!(
            series = %spec.publication_id,
            column = spec.column.column_name(),
            %start,
            %end,
            "fetching series"
        );
        let observations = source.fetch(&spec.publication_id, start, end)?;

        let in_range: Vec<Observation> = observations
            .into_iter()
            .filter(|o| o.gas_day >= start && o.gas_day <= end)
            .collect();
        if in_range.is_empty() {
            return Err(AppError::data_unavailable(
                &spec.publication_id,
                format!("no observations between {start} and {end}"),
            ));
        }
        let daily = aggregate_daily(&in_range, spec.aggregation);
        debug!(
            series = %spec.publication_id,
            observations = in_range.len(),
            days = daily.len(),
            aggregation = ?spec.aggregation,
            "aggregated series"
        );
        series.push((spec.column, daily));
    }

    let panel = join_series(&series);
    info!(
        rows = panel.len(),
        first = ?panel.first_day(),
        last = ?panel.last_day(),
        "built daily panel"
    );
    for column in SeriesColumn::ALL {
        debug!(
            column = column.column_name(),
            days = panel.coverage(column),
            "column coverage"
        );
    }
    Ok(panel)
}
