//! On-disk bar cache with expiration.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{debug, info, warn};
use trading_core::error::DataError;
use trading_core::traits::DataSource;
use trading_core::types::{Bar, Timeframe};

const SECONDS_PER_DAY: u64 = 86_400;

/// Cached payload, stored as one JSON file per request.
#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    symbol: String,
    timeframe: Timeframe,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    bars: Vec<Bar>,
}

/// JSON files keyed by (symbol, timeframe, date range).
#[derive(Debug, Clone)]
pub struct DataCache {
    cache_dir: PathBuf,
    expiration: Duration,
}

impl DataCache {
    /// Create a cache whose entries expire after `expiration_days`.
    pub fn new(cache_dir: impl Into<PathBuf>, expiration_days: u32) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            expiration: Duration::from_secs(u64::from(expiration_days) * SECONDS_PER_DAY),
        }
    }

    /// Cache key for a request. Symbol bytes other than ASCII alphanumerics,
    /// `.` and `-` are written as `%XX`, so distinct symbols never share a key.
    pub fn cache_key(
        symbol: &str,
        timeframe: Timeframe,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> String {
        let mut escaped = String::with_capacity(symbol.len());
        for byte in symbol.bytes() {
            if byte.is_ascii_alphanumeric() || byte == b'.' || byte == b'-' {
                escaped.push(char::from(byte));
            } else {
                escaped.push('%');
                escaped.push_str(&hex::encode_upper([byte]));
            }
        }
        format!(
            "{}_{}_{}_{}",
            escaped,
            timeframe,
            start.format("%Y%m%d"),
            end.format("%Y%m%d")
        )
    }

    fn path(&self, key: &str) -> PathBuf {
        self.cache_dir.join(format!("{key}.json"))
    }

    fn is_fresh(&self, path: &Path) -> bool {
        std::fs::metadata(path)
            .and_then(|m| m.modified())
            .ok()
            .and_then(|modified| SystemTime::now().duration_since(modified).ok())
            .is_some_and(|age| age < self.expiration)
    }

    /// Cached bars, if present and not expired. Unreadable entries count as misses.
    pub async fn get(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Option<Vec<Bar>> {
        let path = self.path(&Self::cache_key(symbol, timeframe, start, end));
        if !self.is_fresh(&path) {
            return None;
        }
        let content = tokio::fs::read(&path).await.ok()?;
        match serde_json::from_slice::<CacheEntry>(&content) {
            Ok(entry) => Some(entry.bars),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Discarding unreadable cache entry");
                None
            }
        }
    }

    /// Store bars for a request.
    pub async fn put(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        bars: &[Bar],
    ) -> Result<PathBuf, DataError> {
        let entry = CacheEntry {
            symbol: symbol.to_string(),
            timeframe,
            start,
            end,
            bars: bars.to_vec(),
        };
        let json = serde_json::to_vec(&entry).map_err(|e| DataError::CacheError(e.to_string()))?;
        let path = self.path(&Self::cache_key(symbol, timeframe, start, end));

        tokio::fs::create_dir_all(&self.cache_dir)
            .await
            .map_err(|e| DataError::CacheError(e.to_string()))?;
        tokio::fs::write(&path, json)
            .await
            .map_err(|e| DataError::CacheError(e.to_string()))?;
        Ok(path)
    }

    /// Remove every cache file. Returns how many were deleted.
    pub async fn clear(&self) -> Result<usize, DataError> {
        let mut entries = match tokio::fs::read_dir(&self.cache_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(DataError::CacheError(e.to_string())),
        };

        let mut removed = 0;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| DataError::CacheError(e.to_string()))?
        {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                tokio::fs::remove_file(&path)
                    .await
                    .map_err(|e| DataError::CacheError(e.to_string()))?;
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Get cache directory.
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }
}

/// Wraps a source with the on-disk cache. Without a cache it passes through.
pub struct CachedDataSource<S> {
    inner: S,
    cache: Option<DataCache>,
}

impl<S: DataSource> CachedDataSource<S> {
    pub fn new(inner: S, cache: DataCache) -> Self {
        Self {
            inner,
            cache: Some(cache),
        }
    }

    pub fn disabled(inner: S) -> Self {
        Self { inner, cache: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.cache.is_some()
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: DataSource> DataSource for CachedDataSource<S> {
    async fn get_historical_bars(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Bar>, DataError> {
        let Some(cache) = &self.cache else {
            return self
                .inner
                .get_historical_bars(symbol, timeframe, start, end)
                .await;
        };

        if let Some(bars) = cache.get(symbol, timeframe, start, end).await {
            info!(symbol, %timeframe, bars = bars.len(), "Loaded bars from cache");
            return Ok(bars);
        }

        info!(symbol, %timeframe, source = self.inner.name(), "Fetching fresh bars");
        let bars = self
            .inner
            .get_historical_bars(symbol, timeframe, start, end)
            .await?;

        // NaN does not survive JSON; leave such series to the engine to reject
        if !bars.iter().all(Bar::is_finite) {
            debug!(symbol, "Series has non-finite values, not caching");
            return Ok(bars);
        }
        // A failed cache write never fails the load
        match cache.put(symbol, timeframe, start, end, &bars).await {
            Ok(path) => debug!(path = %path.display(), "Cached bars"),
            Err(e) => warn!(symbol, error = %e, "Failed to write cache entry"),
        }
        Ok(bars)
    }

    async fn is_valid_symbol(&self, symbol: &str) -> Result<bool, DataError> {
        self.inner.is_valid_symbol(symbol).await
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Counts fetches and returns a fixed series.
    struct CountingSource {
        calls: Arc<AtomicUsize>,
        close: f64,
    }

    fn counting(calls: &Arc<AtomicUsize>) -> CountingSource {
        CountingSource {
            calls: calls.clone(),
            close: 11.5,
        }
    }

    #[async_trait]
    impl DataSource for CountingSource {
        async fn get_historical_bars(
            &self,
            _symbol: &str,
            _timeframe: Timeframe,
            _start: DateTime<Utc>,
            _end: DateTime<Utc>,
        ) -> Result<Vec<Bar>, DataError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![
                Bar::new(0, 10.0, 11.0, 9.0, 10.5, 100.0),
                Bar::new(86_400_000, 10.5, 12.0, 10.0, self.close, 120.0),
            ])
        }

        async fn is_valid_symbol(&self, _symbol: &str) -> Result<bool, DataError> {
            Ok(true)
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    fn range() -> (DateTime<Utc>, DateTime<Utc>) {
        (
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 12, 31, 0, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_cache_key() {
        let (start, end) = range();
        assert_eq!(
            DataCache::cache_key("BTC/USD", Timeframe::Daily, start, end),
            "BTC%2FUSD_1d_20240101_20241231"
        );
        assert_ne!(
            DataCache::cache_key("BRK/B", Timeframe::Daily, start, end),
            DataCache::cache_key("BRK-B", Timeframe::Daily, start, end)
        );
        assert_eq!(
            DataCache::cache_key("BRK-B", Timeframe::Daily, start, end),
            "BRK-B_1d_20240101_20241231"
        );
        // The escape character itself is escaped
        assert_eq!(
            DataCache::cache_key("A%2F", Timeframe::Daily, start, end),
            "A%252F_1d_20240101_20241231"
        );
    }

    #[tokio::test]
    async fn test_second_load_hits_cache() {
        let dir = tempfile::tempdir().unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let source = CachedDataSource::new(
            counting(&calls),
            DataCache::new(dir.path(), 7),
        );
        let (start, end) = range();

        let first = source
            .get_historical_bars("SPY", Timeframe::Daily, start, end)
            .await
            .unwrap();
        let second = source
            .get_historical_bars("SPY", Timeframe::Daily, start, end)
            .await
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // A different range is a different key
        source
            .get_historical_bars("SPY", Timeframe::Daily, start, start)
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_expired_entries_refetch() {
        let dir = tempfile::tempdir().unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        // Zero days: every entry is already stale
        let source = CachedDataSource::new(
            counting(&calls),
            DataCache::new(dir.path(), 0),
        );
        let (start, end) = range();

        for _ in 0..2 {
            source
                .get_historical_bars("SPY", Timeframe::Daily, start, end)
                .await
                .unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_disabled_cache_passes_through() {
        let calls = Arc::new(AtomicUsize::new(0));
        let source = CachedDataSource::disabled(counting(&calls));
        let (start, end) = range();

        for _ in 0..3 {
            source
                .get_historical_bars("SPY", Timeframe::Daily, start, end)
                .await
                .unwrap();
        }
        assert!(!source.is_enabled());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_non_finite_series_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let source = CachedDataSource::new(
            CountingSource {
                calls: calls.clone(),
                close: f64::NAN,
            },
            DataCache::new(dir.path(), 7),
        );
        let (start, end) = range();

        for _ in 0..2 {
            let bars = source
                .get_historical_bars("SPY", Timeframe::Daily, start, end)
                .await
                .unwrap();
            assert!(bars[1].close.is_nan());
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_a_miss_and_clear_removes_files() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DataCache::new(dir.path(), 7);
        let (start, end) = range();

        let key = DataCache::cache_key("SPY", Timeframe::Daily, start, end);
        std::fs::write(dir.path().join(format!("{key}.json")), b"not json").unwrap();
        assert!(cache.get("SPY", Timeframe::Daily, start, end).await.is_none());

        let bars = [Bar::new(0, 1.0, 1.0, 1.0, 1.0, 0.0)];
        cache
            .put("QQQ", Timeframe::Daily, start, end, &bars)
            .await
            .unwrap();
        assert_eq!(
            cache.get("QQQ", Timeframe::Daily, start, end).await.unwrap(),
            bars.to_vec()
        );

        assert_eq!(cache.clear().await.unwrap(), 2);
        assert!(cache.get("QQQ", Timeframe::Daily, start, end).await.is_none());
    }
}
