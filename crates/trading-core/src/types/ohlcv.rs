//! OHLCV (Open, High, Low, Close, Volume) data types.

use serde::{Deserialize, Serialize};

use super::Timeframe;
use crate::error::DataError;

/// Compact OHLCV bar.
/// Uses f64 for fast indicator calculations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[repr(C)]
pub struct Bar {
    /// Unix timestamp in milliseconds
    pub timestamp: i64,
    /// Opening price
    pub open: f64,
    /// Highest price
    pub high: f64,
    /// Lowest price
    pub low: f64,
    /// Closing price
    pub close: f64,
    /// Trading volume
    pub volume: f64,
}

impl Bar {
    /// Create a new bar.
    pub fn new(timestamp: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Calculate the bar's range (high - low).
    #[inline]
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    /// Calculate the true range (used for ATR).
    pub fn true_range(&self, prev_close: Option<f64>) -> f64 {
        match prev_close {
            Some(pc) => {
                let hl = self.high - self.low;
                let hc = (self.high - pc).abs();
                let lc = (self.low - pc).abs();
                hl.max(hc).max(lc)
            }
            None => self.high - self.low,
        }
    }

    fn fields(&self) -> [(&'static str, f64); 5] {
        [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
            ("volume", self.volume),
        ]
    }

    /// Whether every field is a finite number.
    pub fn is_finite(&self) -> bool {
        self.fields().iter().all(|(_, value)| value.is_finite())
    }

    /// Check that every field is present and internally consistent.
    ///
    /// Missing CSV fields surface as NaN, so non-finite values are rejected here.
    pub fn check(&self, index: usize) -> Result<(), DataError> {
        for (name, value) in self.fields() {
            if !value.is_finite() {
                return Err(DataError::InvalidBar {
                    index,
                    reason: format!("{} is missing or not finite", name),
                });
            }
        }
        if self.open <= 0.0 || self.high <= 0.0 || self.low <= 0.0 || self.close <= 0.0 {
            return Err(DataError::InvalidBar {
                index,
                reason: "prices must be positive".to_string(),
            });
        }
        if self.volume < 0.0 {
            return Err(DataError::InvalidBar {
                index,
                reason: "volume must not be negative".to_string(),
            });
        }
        if self.high < self.low
            || self.high < self.open.max(self.close)
            || self.low > self.open.min(self.close)
        {
            return Err(DataError::InvalidBar {
                index,
                reason: format!(
                    "inconsistent range: o={} h={} l={} c={}",
                    self.open, self.high, self.low, self.close
                ),
            });
        }
        Ok(())
    }
}

/// Ordered series of bars for one instrument.
///
/// Bars are never modified once loaded; the engine only reads them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BarSeries {
    /// Symbol identifier
    pub symbol: String,
    /// Timeframe of the bars
    pub timeframe: Timeframe,
    bars: Vec<Bar>,
}

impl BarSeries {
    /// Create a new empty bar series.
    pub fn new(symbol: impl Into<String>, timeframe: Timeframe) -> Self {
        Self {
            symbol: symbol.into(),
            timeframe,
            bars: Vec::new(),
        }
    }

    /// Create a series from already loaded bars.
    pub fn from_bars(symbol: impl Into<String>, timeframe: Timeframe, bars: Vec<Bar>) -> Self {
        Self {
            symbol: symbol.into(),
            timeframe,
            bars,
        }
    }

    /// Append a bar.
    pub fn push(&mut self, bar: Bar) {
        self.bars.push(bar);
    }

    /// Get the number of bars.
    #[inline]
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Check if the series is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Get all bars as a slice.
    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    /// Get a bar by index (0 = oldest).
    pub fn get(&self, index: usize) -> Option<&Bar> {
        self.bars.get(index)
    }

    /// Extract close prices as a vector.
    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }
}
