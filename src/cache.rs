use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use log::{info, warn};
use tokio::sync::RwLock;
use crate::manager_inverter::errors::IngestionError;
use crate::manager_inverter::load_history_export;
use crate::manager_inverter::models::TimeSeries;

/// A parsed series together with the moment it was loaded
struct CacheEntry {
    series: Arc<TimeSeries>,
    loaded_at: Instant,
}

/// Freshness-window cache around the historical-export ingestion
///
/// Holds at most one series per process. Reads within the freshness
/// window never touch the filesystem. A refresh runs under the write
/// lock, so at most one ingestion executes at a time while cache hits
/// keep going through the read lock.
pub struct SeriesCache {
    max_age: Duration,
    slot: RwLock<Option<CacheEntry>>,
}

impl SeriesCache {
    /// Returns a new, unpopulated cache
    ///
    /// # Arguments
    ///
    /// * 'max_age' - freshness window after which the series is rebuilt
    pub fn new(max_age: Duration) -> Self {
        Self { max_age, slot: RwLock::new(None) }
    }

    /// Returns the cached series, re-ingesting the export when the cached
    /// copy is older than the freshness window
    ///
    /// A failed refresh keeps serving the previously loaded series; only
    /// the first-ever load propagates the ingestion error.
    ///
    /// # Arguments
    ///
    /// * 'path' - resolved path to the historical export
    pub async fn load_or_refresh(&self, path: &Path) -> Result<Arc<TimeSeries>, IngestionError> {
        if let Some(series) = self.fresh_series().await {
            return Ok(series);
        }

        let mut slot = self.slot.write().await;
        // Another caller may have refreshed while this one waited for the
        // write lock.
        if let Some(entry) = slot.as_ref() {
            if entry.loaded_at.elapsed() < self.max_age {
                return Ok(Arc::clone(&entry.series));
            }
        }

        match load_history_export(path).await {
            Ok(series) => {
                let series = Arc::new(series);
                info!("historical export refreshed, {} samples", series.samples().len());
                *slot = Some(CacheEntry { series: Arc::clone(&series), loaded_at: Instant::now() });
                Ok(series)
            }
            Err(e) => match slot.as_ref() {
                Some(entry) => {
                    warn!("export refresh failed, serving stale series: {}", e);
                    Ok(Arc::clone(&entry.series))
                }
                None => Err(e),
            },
        }
    }

    async fn fresh_series(&self) -> Option<Arc<TimeSeries>> {
        let slot = self.slot.read().await;
        slot.as_ref()
            .filter(|entry| entry.loaded_at.elapsed() < self.max_age)
            .map(|entry| Arc::clone(&entry.series))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    const TWO_ROWS: &str = "\
banner;;
banner;;
Time;Power(W);Total Generation(kWh)
08.09.2025 06:00:00;1500,0;10,0
08.09.2025 07:00:00;1800,0;11,0
";

    const THREE_ROWS: &str = "\
banner;;
banner;;
Time;Power(W);Total Generation(kWh)
08.09.2025 06:00:00;1500,0;10,0
08.09.2025 07:00:00;1800,0;11,0
08.09.2025 08:00:00;2000,0;12,0
";

    fn fixture(dir: &tempfile::TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("Historical Data Export-test.csv");
        fs::write(&path, content).unwrap();
        path
    }

    #[actix_web::test]
    async fn fresh_cache_skips_the_filesystem() {
        let dir = tempfile::tempdir().unwrap();
        let path = fixture(&dir, TWO_ROWS);
        let cache = SeriesCache::new(Duration::from_secs(600));

        let first = cache.load_or_refresh(&path).await.unwrap();
        assert_eq!(first.samples().len(), 2);

        // A mutation on disk must stay invisible within the window.
        fs::write(&path, THREE_ROWS).unwrap();
        let second = cache.load_or_refresh(&path).await.unwrap();
        assert_eq!(second.samples().len(), 2);
    }

    #[actix_web::test]
    async fn stale_cache_is_rebuilt() {
        let dir = tempfile::tempdir().unwrap();
        let path = fixture(&dir, TWO_ROWS);
        let cache = SeriesCache::new(Duration::ZERO);

        let first = cache.load_or_refresh(&path).await.unwrap();
        assert_eq!(first.samples().len(), 2);

        fs::write(&path, THREE_ROWS).unwrap();
        let second = cache.load_or_refresh(&path).await.unwrap();
        assert_eq!(second.samples().len(), 3);
    }

    #[actix_web::test]
    async fn failed_refresh_serves_stale_series() {
        let dir = tempfile::tempdir().unwrap();
        let path = fixture(&dir, TWO_ROWS);
        let cache = SeriesCache::new(Duration::ZERO);

        cache.load_or_refresh(&path).await.unwrap();
        fs::remove_file(&path).unwrap();

        let served = cache.load_or_refresh(&path).await.unwrap();
        assert_eq!(served.samples().len(), 2);
    }

    #[actix_web::test]
    async fn first_load_failure_propagates() {
        let cache = SeriesCache::new(Duration::from_secs(600));
        let err = cache
            .load_or_refresh(Path::new("/nonexistent/export.csv"))
            .await
            .unwrap_err();
        assert!(matches!(err, IngestionError::FileNotFound(_)));
    }
}
