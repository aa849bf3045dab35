//! Writers that persist completed runs.
//!
//! Export is a side channel: a failing writer is logged and never changes
//! the outcome of the run it was given.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use trading_core::error::{TradingError, TradingResult};

use crate::engine::BacktestResult;

/// Sink for a completed run.
pub trait ReportWriter: Send + Sync {
    fn name(&self) -> &str;

    /// Persist `result`, returning the files written.
    fn write(&self, result: &BacktestResult) -> TradingResult<Vec<PathBuf>>;
}

fn file_stem(result: &BacktestResult) -> String {
    format!("{}_{}", result.strategy, result.symbol).replace(['/', '\\', ' '], "_")
}

fn ensure_dir(dir: &Path) -> TradingResult<()> {
    fs::create_dir_all(dir)?;
    Ok(())
}

fn csv_err(e: csv::Error) -> TradingError {
    TradingError::Serialization(e.to_string())
}

/// Trade log and equity curve as delimited text.
#[derive(Debug, Clone)]
pub struct CsvReportWriter {
    dir: PathBuf,
}

impl CsvReportWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ReportWriter for CsvReportWriter {
    fn name(&self) -> &str {
        "csv"
    }

    fn write(&self, result: &BacktestResult) -> TradingResult<Vec<PathBuf>> {
        ensure_dir(&self.dir)?;
        let stem = file_stem(result);

        let trades_path = self.dir.join(format!("{}_trades.csv", stem));
        let mut writer = csv::Writer::from_path(&trades_path).map_err(csv_err)?;
        for trade in &result.trades {
            writer.serialize(trade).map_err(csv_err)?;
        }
        writer.flush()?;

        let equity_path = self.dir.join(format!("{}_equity.csv", stem));
        let mut writer = csv::Writer::from_path(&equity_path).map_err(csv_err)?;
        for point in &result.equity_curve {
            writer.serialize(point).map_err(csv_err)?;
        }
        writer.flush()?;

        Ok(vec![trades_path, equity_path])
    }
}

/// Full result (report, trades, equity curve, signals) as one JSON document.
#[derive(Debug, Clone)]
pub struct JsonReportWriter {
    dir: PathBuf,
}

impl JsonReportWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ReportWriter for JsonReportWriter {
    fn name(&self) -> &str {
        "json"
    }

    fn write(&self, result: &BacktestResult) -> TradingResult<Vec<PathBuf>> {
        ensure_dir(&self.dir)?;
        let path = self.dir.join(format!("{}_report.json", file_stem(result)));
        let json = result
            .to_json()
            .map_err(|e| TradingError::Serialization(e.to_string()))?;
        fs::write(&path, json)?;
        Ok(vec![path])
    }
}

/// Run every writer, logging failures. Returns the number that failed.
pub fn write_all(writers: &[Box<dyn ReportWriter>], result: &BacktestResult) -> usize {
    let mut failures = 0;
    for writer in writers {
        match writer.write(result) {
            Ok(paths) => info!(writer = writer.name(), files = paths.len(), "Results exported"),
            Err(e) => {
                failures += 1;
                warn!(writer = writer.name(), error = %e, "Export failed");
            }
        }
    }
    failures
}
