//! Cache-aware series client.
//!
//! `DataClient` sits between the dataset builder and the HTTP transport:
//! cache lookup -> download on miss -> parse -> store -> observations.

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::data::cache::{CacheKey, RawCache};
use crate::data::national_gas::parse_publication_csv;
use crate::data::{SeriesSource, Transport};
use crate::domain::Observation;
use crate::error::AppError;

pub struct DataClient<T> {
    transport: T,
    cache: Option<RawCache>,
    refresh: bool,
}

impl<T: Transport> DataClient<T> {
    /// A client with no cache: every fetch hits the transport.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            cache: None,
            refresh: false,
        }
    }

    pub fn with_cache(mut self, cache: RawCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Skip cache reads; fresh responses are still written back.
    pub fn with_refresh(mut self, refresh: bool) -> Self {
        self.refresh = refresh;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn cached_payload(&self, key: &CacheKey) -> Option<String> {
        if self.refresh {
            return None;
        }
        let cache = self.cache.as_ref()?;
        match cache.get(key) {
            Ok(Some(payload)) => {
                debug!(series = %key.series_id, file = %key.file_name(), "cache hit");
                Some(payload)
            }
            Ok(None) => {
                debug!(series = %key.series_id, "cache miss");
                None
            }
            Err(e) => {
                warn!(series = %key.series_id, error = %e, "cache read failed; downloading instead");
                None
            }
        }
    }
}

impl<T: Transport> SeriesSource for DataClient<T> {
    fn fetch(&self, series_id: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<Observation>, AppError> {
        let key = CacheKey::new(series_id, start, end);

        if let Some(payload) = self.cached_payload(&key) {
            return parse_checked(series_id, &payload)
                .map_err(|e| AppError::data_unavailable(series_id, format!("{e} (cached copy; re-run with --refresh)")));
        }

        let payload = self.transport.download(series_id, start, end)?;
        let observations = parse_checked(series_id, &payload).map_err(|e| AppError::data_unavailable(series_id, e))?;

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.put(&key, &payload) {
                warn!(series = %series_id, error = %e, "cache write failed");
            }
        }

        Ok(observations)
    }
}

fn parse_checked(series_id: &str, payload: &str) -> Result<Vec<Observation>, String> {
    let data = parse_publication_csv(payload)?;
    if data.skipped_rows > 0 {
        warn!(series = %series_id, skipped = data.skipped_rows, "skipped rows without a usable value");
    }
    if data.observations.is_empty() {
        return Err("no observations returned".to_string());
    }
    Ok(data.observations)
}
