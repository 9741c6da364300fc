//! Data acquisition: National Gas downloads, the raw response cache, and the
//! synthetic panel generator.

use chrono::NaiveDate;

use crate::domain::Observation;
use crate::error::AppError;

pub mod cache;
pub mod client;
pub mod national_gas;
pub mod sample;

pub use cache::{CacheKey, RawCache};
pub use client::DataClient;
pub use national_gas::{NationalGasApi, PublicationData, parse_publication_csv};
pub use sample::{SampleConfig, generate_panel};

/// Anything that can hand back observations for a publication over a date range.
///
/// Implementations fail with `ErrorKind::DataUnavailable` rather than returning
/// an empty vector.
pub trait SeriesSource {
    fn fetch(&self, series_id: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<Observation>, AppError>;
}

/// Raw payload download for one publication over a date range.
pub trait Transport {
    fn download(&self, series_id: &str, start: NaiveDate, end: NaiveDate) -> Result<String, AppError>;
}
