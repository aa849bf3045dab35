//! CSV data source.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use csv::ReaderBuilder;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;
use trading_core::error::DataError;
use trading_core::traits::DataSource;
use trading_core::types::{Bar, Timeframe};

/// CSV record format.
///
/// Price fields are optional so that a blank cell becomes NaN and is
/// reported by the engine with its bar index instead of failing the parse.
#[derive(Debug, Deserialize)]
struct CsvRecord {
    #[serde(alias = "Date", alias = "timestamp", alias = "Timestamp")]
    date: String,
    #[serde(alias = "Open")]
    open: Option<f64>,
    #[serde(alias = "High")]
    high: Option<f64>,
    #[serde(alias = "Low")]
    low: Option<f64>,
    #[serde(alias = "Close")]
    close: Option<f64>,
    #[serde(alias = "Volume", default)]
    volume: Option<f64>,
}

impl CsvRecord {
    fn into_bar(self, timestamp: i64) -> Bar {
        let value = |v: Option<f64>| v.unwrap_or(f64::NAN);
        Bar::new(
            timestamp,
            value(self.open),
            value(self.high),
            value(self.low),
            value(self.close),
            self.volume.unwrap_or(0.0),
        )
    }
}

/// Historical bars from CSV files.
///
/// The root is either a single file, used for every symbol, or a directory
/// holding one `{symbol}.csv` per symbol. Rows are returned in file order.
#[derive(Debug, Clone)]
pub struct CsvDataSource {
    root: PathBuf,
}

impl CsvDataSource {
    /// Create a source over a file or directory.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, DataError> {
        let root = path.as_ref().to_path_buf();
        if !root.exists() {
            return Err(DataError::NoDataAvailable);
        }
        Ok(Self { root })
    }

    /// File holding the bars of `symbol`.
    pub fn path_for(&self, symbol: &str) -> PathBuf {
        if self.root.is_dir() {
            self.root.join(format!("{symbol}.csv"))
        } else {
            self.root.clone()
        }
    }

    /// Load every bar in the symbol's file.
    pub async fn load_all(&self, symbol: &str) -> Result<Vec<Bar>, DataError> {
        let path = self.path_for(symbol);
        let content = tokio::fs::read(&path)
            .await
            .map_err(|_| DataError::SymbolNotFound(symbol.to_string()))?;
        let bars = parse_csv(&content)?;
        debug!(symbol, path = %path.display(), bars = bars.len(), "Loaded CSV");
        Ok(bars)
    }
}

#[async_trait]
impl DataSource for CsvDataSource {
    async fn get_historical_bars(
        &self,
        symbol: &str,
        _timeframe: Timeframe,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Bar>, DataError> {
        let (from, to) = (start.timestamp_millis(), end.timestamp_millis());
        let mut bars = self.load_all(symbol).await?;
        bars.retain(|b| b.timestamp >= from && b.timestamp <= to);
        Ok(bars)
    }

    async fn is_valid_symbol(&self, symbol: &str) -> Result<bool, DataError> {
        Ok(tokio::fs::try_exists(self.path_for(symbol))
            .await
            .unwrap_or(false))
    }

    fn name(&self) -> &str {
        "csv"
    }
}

/// Parse CSV bytes with a header row into bars.
pub fn parse_csv(content: &[u8]) -> Result<Vec<Bar>, DataError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content);

    let mut bars = Vec::new();
    for (row, result) in reader.deserialize().enumerate() {
        let record: CsvRecord =
            result.map_err(|e| DataError::ParseError(format!("row {}: {}", row + 1, e)))?;
        let timestamp = parse_timestamp(&record.date)?;
        bars.push(record.into_bar(timestamp));
    }
    Ok(bars)
}

/// Parse a date, date-time, or Unix timestamp into milliseconds.
pub fn parse_timestamp(date_str: &str) -> Result<i64, DataError> {
    const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y/%m/%d %H:%M"];
    const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d-%m-%Y"];

    if let Ok(dt) = DateTime::parse_from_rfc3339(date_str) {
        return Ok(dt.timestamp_millis());
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(date_str, format) {
            return Ok(dt.and_utc().timestamp_millis());
        }
    }
    for format in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(date_str, format) {
            return Ok(d.and_time(NaiveTime::MIN).and_utc().timestamp_millis());
        }
    }

    // Unix timestamp: milliseconds above 10 digits, seconds otherwise
    if let Ok(ts) = date_str.parse::<i64>() {
        return Ok(if ts > 10_000_000_000 { ts } else { ts * 1000 });
    }

    Err(DataError::ParseError(format!(
        "Could not parse date: {}",
        date_str
    )))
}
