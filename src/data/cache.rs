//! Flat-file cache for raw publication responses.
//!
//! One file per (publication id, start day, end day). The file holds the payload
//! exactly as the API returned it, so a cache hit goes through the same parser as
//! a fresh download.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::error::AppError;

const CACHE_EXT: &str = "csv";

/// Cache key for one raw response.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub series_id: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl CacheKey {
    pub fn new(series_id: &str, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            series_id: series_id.to_string(),
            start,
            end,
        }
    }

    /// `<id>_raw_<start>_<end>.csv`, with the id reduced to `[A-Za-z0-9_-]`.
    pub fn file_name(&self) -> String {
        let id: String = self
            .series_id
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        format!("{id}_raw_{}_{}.{CACHE_EXT}", self.start, self.end)
    }
}

#[derive(Debug, Clone)]
pub struct RawCache {
    dir: PathBuf,
}

impl RawCache {
    /// Open (and create if needed) a cache rooted at `dir`.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, AppError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| {
            AppError::io(format!("Failed to create cache directory '{}': {e}", dir.display()))
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.path_for(key).is_file()
    }

    /// Returns `None` on a miss.
    pub fn get(&self, key: &CacheKey) -> Result<Option<String>, AppError> {
        let path = self.path_for(key);
        if !path.is_file() {
            return Ok(None);
        }
        fs::read_to_string(&path)
            .map(Some)
            .map_err(|e| AppError::io(format!("Failed to read cache entry '{}': {e}", path.display())))
    }

    /// Store a payload. Written to a temp file first so a crash never leaves a
    /// truncated entry behind.
    pub fn put(&self, key: &CacheKey, payload: &str) -> Result<(), AppError> {
        let path = self.path_for(key);
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, payload)
            .map_err(|e| AppError::io(format!("Failed to write cache entry '{}': {e}", tmp.display())))?;
        fs::rename(&tmp, &path)
            .map_err(|e| AppError::io(format!("Failed to finalize cache entry '{}': {e}", path.display())))
    }

    /// Number of cached responses.
    pub fn len(&self) -> Result<usize, AppError> {
        Ok(self.entries()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, AppError> {
        Ok(self.len()? == 0)
    }

    /// Remove every cached response; returns how many were removed.
    pub fn clear(&self) -> Result<usize, AppError> {
        let entries = self.entries()?;
        for path in &entries {
            fs::remove_file(path)
                .map_err(|e| AppError::io(format!("Failed to remove cache entry '{}': {e}", path.display())))?;
        }
        Ok(entries.len())
    }

    fn entries(&self) -> Result<Vec<PathBuf>, AppError> {
        let read = fs::read_dir(&self.dir).map_err(|e| {
            AppError::io(format!("Failed to list cache directory '{}': {e}", self.dir.display()))
        })?;
        Ok(read
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && path.extension().and_then(|s| s.to_str()) == Some(CACHE_EXT))
            .collect())
    }

    fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(key.file_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(id: &str) -> CacheKey {
        CacheKey::new(
            id,
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 21).unwrap(),
        )
    }

    #[test]
    fn file_name_encodes_the_whole_key() {
        assert_eq!(key("PUBOB39").file_name(), "PUBOB39_raw_2025-01-01_2025-01-21.csv");
        assert_eq!(key("a/b c").file_name(), "a_b_c_raw_2025-01-01_2025-01-21.csv");
    }

    #[test]
    fn put_get_clear() {
        let temp_dir = tempfile::tempdir().unwrap();
        let cache = RawCache::new(temp_dir.path().join("raw")).unwrap();
        let k = key("PUBOB39");

        assert!(!cache.contains(&k));
        assert_eq!(cache.get(&k).unwrap(), None);

        cache.put(&k, "Applicable At,Value\n").unwrap();
        assert!(cache.contains(&k));
        assert_eq!(cache.get(&k).unwrap().as_deref(), Some("Applicable At,Value\n"));
        assert_eq!(cache.len().unwrap(), 1);

        assert_eq!(cache.clear().unwrap(), 1);
        assert!(!cache.contains(&k));
        assert!(cache.is_empty().unwrap());
    }

    #[test]
    fn different_ranges_do_not_collide() {
        let temp_dir = tempfile::tempdir().unwrap();
        let cache = RawCache::new(temp_dir.path()).unwrap();
        let a = key("PUBOB39");
        let b = CacheKey {
            end: NaiveDate::from_ymd_opt(2025, 1, 22).unwrap(),
            ..a.clone()
        };

        cache.put(&a, "a").unwrap();
        assert!(!cache.contains(&b));
        cache.put(&b, "b").unwrap();
        assert_eq!(cache.get(&a).unwrap().as_deref(), Some("a"));
        assert_eq!(cache.clear().unwrap(), 2);
        assert_eq!(cache.len().unwrap(), 0);
    }
}
