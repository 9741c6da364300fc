//! National Gas data portal integration.
//!
//! The portal serves every publication through one CSV download endpoint. We ask
//! for gas-day keyed data with only the latest publication per applicable time.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use csv::StringRecord;
use reqwest::blocking::Client;

use crate::data::Transport;
use crate::domain::Observation;
use crate::error::AppError;

const BASE_URL: &str = "https://data.nationalgas.com/api/find-gas-data-download";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

const COL_APPLICABLE_AT: &str = "applicable at";
const COL_APPLICABLE_FOR: &str = "applicable for";
const COL_VALUE: &str = "value";

const DATETIME_FORMATS: [&str; 6] = [
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];
const DATE_FORMATS: [&str; 2] = ["%d/%m/%Y", "%Y-%m-%d"];

/// Blocking HTTP transport for the National Gas download endpoint.
pub struct NationalGasApi {
    client: Client,
    base_url: String,
}

impl NationalGasApi {
    /// Build from environment (`.env` is honoured).
    ///
    /// - `NATIONAL_GAS_API_URL` overrides the endpoint.
    /// - `NATIONAL_GAS_TIMEOUT_SECS` overrides the request timeout.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        let base_url = std::env::var("NATIONAL_GAS_API_URL").unwrap_or_else(|_| BASE_URL.to_string());
        let timeout_secs = match std::env::var("NATIONAL_GAS_TIMEOUT_SECS") {
            Ok(raw) => raw.trim().parse::<u64>().map_err(|_| {
                AppError::config(format!("Invalid NATIONAL_GAS_TIMEOUT_SECS '{raw}' (expected whole seconds)."))
            })?,
            Err(_) => DEFAULT_TIMEOUT_SECS,
        };
        Self::new(base_url, Duration::from_secs(timeout_secs))
    }

    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

impl Transport for NationalGasApi {
    fn download(&self, series_id: &str, start: NaiveDate, end: NaiveDate) -> Result<String, AppError> {
        let date_from = format!("{start}T00:00:00");
        let date_to = format!("{end}T23:59:59");

        let resp = self
            .client
            .get(&self.base_url)
            .query(&[
                ("ids", series_id),
                ("dateFrom", date_from.as_str()),
                ("dateTo", date_to.as_str()),
                ("dateType", "GASDAY"),
                ("applicableFor", "Y"),
                ("latestFlag", "Y"),
                ("type", "CSV"),
            ])
            .send()
            .map_err(|e| AppError::data_unavailable(series_id, format!("request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(AppError::data_unavailable(
                series_id,
                format!("request failed with status {}", resp.status()),
            ));
        }

        resp.text()
            .map_err(|e| AppError::data_unavailable(series_id, format!("failed to read response body: {e}")))
    }
}

/// Parsed download: usable observations plus how many rows had no usable value.
#[derive(Debug, Clone, Default)]
pub struct PublicationData {
    pub observations: Vec<Observation>,
    pub skipped_rows: usize,
}

/// Parse a publication CSV payload.
///
/// Requires `Applicable At` and `Value` columns; `Applicable For` (the gas day) is
/// used when present, otherwise the date part of `Applicable At`. Rows whose value
/// is blank or non-numeric are skipped and counted. A row with an unparseable
/// timestamp is an error: the payload is not what we think it is.
pub fn parse_publication_csv(payload: &str) -> Result<PublicationData, String> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(payload.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| format!("failed to read CSV headers: {e}"))?
        .clone();
    let header_map = build_header_map(&headers);

    let at_idx = *header_map
        .get(COL_APPLICABLE_AT)
        .ok_or_else(|| "missing 'Applicable At' column".to_string())?;
    let value_idx = *header_map
        .get(COL_VALUE)
        .ok_or_else(|| "missing 'Value' column".to_string())?;
    let for_idx = header_map.get(COL_APPLICABLE_FOR).copied();

    let mut out = PublicationData::default();
    for (idx, result) in reader.records().enumerate() {
        // +2: header is line 1 and records are 1-based.
        let line = idx + 2;
        let record = result.map_err(|e| format!("CSV parse error on line {line}: {e}"))?;

        let Some(value) = record.get(value_idx).and_then(parse_value) else {
            out.skipped_rows += 1;
            continue;
        };

        let raw_at = record.get(at_idx).unwrap_or("");
        let timestamp = parse_datetime(raw_at)
            .ok_or_else(|| format!("invalid 'Applicable At' value '{raw_at}' on line {line}"))?;

        let gas_day = match for_idx.and_then(|i| record.get(i)).filter(|s| !s.is_empty()) {
            Some(raw) => parse_date(raw)
                .ok_or_else(|| format!("invalid 'Applicable For' value '{raw}' on line {line}"))?,
            None => timestamp.date(),
        };

        out.observations.push(Observation {
            gas_day,
            timestamp,
            value,
        });
    }

    Ok(out)
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Some exports carry a UTF-8 BOM on the first header.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_lowercase()
}

fn parse_value(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let v = trimmed.replace(',', "").parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}

fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| parse_date(raw).and_then(|d| d.and_hms_opt(0, 0, 0)))
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\u{feff}Applicable At,Applicable For,Data Item,Value,Generated Time,Quality Indicator\n\
        01/02/2025 13:00:00,01/02/2025,\"NTS Demand Forecast, D+1\",285.4,01/02/2025 13:05:00,\n\
        01/02/2025 16:00:00,01/02/2025,\"NTS Demand Forecast, D+1\",287.1,01/02/2025 16:05:00,\n\
        02/02/2025 13:00:00,02/02/2025,\"NTS Demand Forecast, D+1\",,02/02/2025 13:05:00,\n\
        03/02/2025 13:00:00,03/02/2025,\"NTS Demand Forecast, D+1\",\"1,290.0\",03/02/2025 13:05:00,A\n";

    #[test]
    fn parses_day_first_publication_csv() {
        let data = parse_publication_csv(SAMPLE).unwrap();
        assert_eq!(data.observations.len(), 3);
        assert_eq!(data.skipped_rows, 1);

        let first = &data.observations[0];
        assert_eq!(first.gas_day, NaiveDate::from_ymd_opt(2025, 2, 1).unwrap());
        assert_eq!(
            first.timestamp,
            NaiveDate::from_ymd_opt(2025, 2, 1).unwrap().and_hms_opt(13, 0, 0).unwrap()
        );
        assert!((first.value - 285.4).abs() < 1e-12);
        assert!((data.observations[2].value - 1290.0).abs() < 1e-12);
    }

    #[test]
    fn gas_day_falls_back_to_timestamp_date() {
        let payload = "Applicable At,Value\n2025-02-03T06:00:00,340.5\n";
        let data = parse_publication_csv(payload).unwrap();
        assert_eq!(data.observations[0].gas_day, NaiveDate::from_ymd_opt(2025, 2, 3).unwrap());
    }

    #[test]
    fn missing_value_column_is_an_error() {
        let err = parse_publication_csv("Applicable At,Other\n01/02/2025 13:00:00,1\n").unwrap_err();
        assert!(err.contains("Value"));
    }

    #[test]
    fn bad_timestamp_is_an_error() {
        let err = parse_publication_csv("Applicable At,Value\nyesterday,1.0\n").unwrap_err();
        assert!(err.contains("line 2"));
    }

    #[test]
    fn header_only_payload_has_no_observations() {
        let data = parse_publication_csv("Applicable At,Applicable For,Value\n").unwrap();
        assert!(data.observations.is_empty());
    }
}
