//! Market data sources for the backtester.
//!
//! Sources return bars oldest first; validation of the series is left to
//! the engine, which reports the offending bar index.

mod cache;
mod csv_source;

pub use cache::{CachedDataSource, DataCache};
pub use csv_source::{parse_csv, parse_timestamp, CsvDataSource};

use chrono::{DateTime, Utc};
use tracing::info;
use trading_core::error::DataError;
use trading_core::traits::DataSource;
use trading_core::types::{BarSeries, Timeframe};

/// Load a series from any source. An empty result is an error.
pub async fn load_series(
    source: &dyn DataSource,
    symbol: &str,
    timeframe: Timeframe,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<BarSeries, DataError> {
    let bars = source
        .get_historical_bars(symbol, timeframe, start, end)
        .await?;
    if bars.is_empty() {
        return Err(DataError::NoDataAvailable);
    }
    info!(symbol, %timeframe, bars = bars.len(), source = source.name(), "Loaded series");
    Ok(BarSeries::from_bars(symbol, timeframe, bars))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[tokio::test]
    async fn test_load_series_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prices.csv");
        std::fs::write(
            &path,
            "timestamp,open,high,low,close,volume\n\
             1704153600,1,2,0.5,1.5,10\n\
             1704240000,1.5,2,1,1.8,12\n",
        )
        .unwrap();

        let source = CsvDataSource::new(&path).unwrap();
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();

        // A single file serves any symbol
        let series = load_series(&source, "ANY", Timeframe::Daily, start, end)
            .await
            .unwrap();
        assert_eq!(series.symbol, "ANY");
        assert_eq!(series.len(), 2);

        let later = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let empty = load_series(&source, "ANY", Timeframe::Daily, later, later).await;
        assert!(matches!(empty, Err(DataError::NoDataAvailable)));
    }
}
