//! Time-boxed on-disk cache of the extracted catalog.
//!
//! Two files: `catalog.json` (the extracted records) and `catalog.timestamp`
//! (fetch time in seconds since the Unix epoch). The cache is valid only
//! while both exist, the timestamp parses, and it is younger than the TTL.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use cloudshelf_core::CatalogRecord;

use crate::client::CatalogSource;
use crate::error::CatalogError;

const PAYLOAD_FILE: &str = "catalog.json";
const TIMESTAMP_FILE: &str = "catalog.timestamp";

/// Default expiry window.
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Freshness of the cache at a point in time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CacheStatus {
    /// Both files present and younger than the TTL.
    Fresh { age: Duration },
    /// Both files present but expired.
    Stale { age: Duration },
    /// A file is missing or the timestamp is unreadable.
    Missing,
}

/// Where the records of a [`CatalogCache::get_catalog`] call came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Cached,
    Fetched,
}

/// Records returned by [`CatalogCache::get_catalog`].
#[derive(Debug)]
pub struct ResolvedCatalog {
    pub records: Vec<CatalogRecord>,
    pub resolution: Resolution,
}

/// The catalog cache directory and its expiry policy.
#[derive(Debug, Clone)]
pub struct CatalogCache {
    dir: PathBuf,
    ttl: Duration,
}

/// Default cache directory: `<cache_dir>/cloudshelf`.
pub fn default_cache_dir() -> Result<PathBuf, CatalogError> {
    let base = dirs::cache_dir()
        .ok_or_else(|| CatalogError::cache("Could not determine cache directory"))?;
    Ok(base.join("cloudshelf"))
}

impl CatalogCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            ttl: DEFAULT_TTL,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn payload_path(&self) -> PathBuf {
        self.dir.join(PAYLOAD_FILE)
    }

    pub fn timestamp_path(&self) -> PathBuf {
        self.dir.join(TIMESTAMP_FILE)
    }

    /// Current freshness of the cache.
    pub fn status(&self) -> CacheStatus {
        if !self.payload_path().exists() {
            return CacheStatus::Missing;
        }
        let fetched_at = match self.read_timestamp() {
            Some(ts) => ts,
            None => return CacheStatus::Missing,
        };
        // A timestamp from the future counts as age zero.
        let age = Duration::from_secs_f64((now_secs() - fetched_at).max(0.0));
        if age < self.ttl {
            CacheStatus::Fresh { age }
        } else {
            CacheStatus::Stale { age }
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self.status(), CacheStatus::Fresh { .. })
    }

    /// Read the cached records regardless of age.
    pub fn load(&self) -> Result<Vec<CatalogRecord>, CatalogError> {
        let contents = fs::read_to_string(self.payload_path())?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Replace the cached payload and stamp the current time.
    pub fn store(&self, records: &[CatalogRecord]) -> Result<(), CatalogError> {
        fs::create_dir_all(&self.dir)?;
        let payload = serde_json::to_string_pretty(records)?;
        write_atomic(&self.payload_path(), payload.as_bytes())?;
        // Timestamp last: a crash between the two writes leaves the old
        // (or no) timestamp, never a fresh stamp on an old payload.
        write_atomic(&self.timestamp_path(), now_secs().to_string().as_bytes())?;
        Ok(())
    }

    /// Return the catalog, refetching from `source` when the cache is not
    /// fresh (or `force_refresh` is set).
    ///
    /// A fetch failure is returned as-is; the caller must not reconcile
    /// against a partial catalog.
    pub async fn get_catalog<S: CatalogSource>(
        &self,
        source: &S,
        force_refresh: bool,
    ) -> Result<ResolvedCatalog, CatalogError> {
        if !force_refresh {
            match self.status() {
                CacheStatus::Fresh { age } => match self.load() {
                    Ok(records) => {
                        log::info!(
                            "Using cached catalog ({} entries, {} min old)",
                            records.len(),
                            age.as_secs() / 60
                        );
                        return Ok(ResolvedCatalog {
                            records,
                            resolution: Resolution::Cached,
                        });
                    }
                    Err(e) => log::warn!("Cached catalog unreadable, refetching: {e}"),
                },
                CacheStatus::Stale { age } => {
                    log::debug!("Catalog cache expired ({}h old)", age.as_secs() / 3600);
                }
                CacheStatus::Missing => log::debug!("No usable catalog cache"),
            }
        }

        let records = source.fetch_catalog().await?;
        self.store(&records)?;
        log::info!("Fetched and cached {} catalog entries", records.len());
        Ok(ResolvedCatalog {
            records,
            resolution: Resolution::Fetched,
        })
    }

    /// Remove both cache files. Returns the number of bytes freed.
    pub fn clear(&self) -> Result<u64, CatalogError> {
        let mut total_size = 0u64;
        for path in [self.payload_path(), self.timestamp_path()] {
            if path.exists() {
                if let Ok(meta) = fs::metadata(&path) {
                    total_size += meta.len();
                }
                fs::remove_file(&path)?;
            }
        }
        Ok(total_size)
    }

    fn read_timestamp(&self) -> Option<f64> {
        let contents = fs::read_to_string(self.timestamp_path()).ok()?;
        match contents.trim().parse::<f64>() {
            Ok(ts) if ts.is_finite() => Some(ts),
            _ => {
                log::warn!("Could not parse cache timestamp {:?}", contents.trim());
                None
            }
        }
    }
}

/// Seconds since the Unix epoch.
pub fn now_secs() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64 / 1000.0
}

/// Write `contents` to a uniquely named temp file beside `path`, then
/// rename it into place.
fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| std::io::Error::other("cache path has no parent directory"))?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
#[path = "tests/cache_tests.rs"]
mod tests;
