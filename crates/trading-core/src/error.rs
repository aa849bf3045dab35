//! Error types for the backtester.

use rust_decimal::Decimal;
use thiserror::Error;

/// Top-level error.
#[derive(Error, Debug)]
pub enum TradingError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Strategy error: {0}")]
    Strategy(#[from] StrategyError),

    #[error("Data error: {0}")]
    Data(#[from] DataError),

    #[error("Indicator error: {0}")]
    Indicator(#[from] IndicatorError),

    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("Run cancelled before bar {bar_index}")]
    Cancelled { bar_index: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl TradingError {
    /// Index of the bar that caused the failure, when there is one.
    pub fn bar_index(&self) -> Option<usize> {
        match self {
            TradingError::Data(e) => e.bar_index(),
            TradingError::Cancelled { bar_index } => Some(*bar_index),
            _ => None,
        }
    }
}

/// Strategy-specific errors.
#[derive(Error, Debug)]
pub enum StrategyError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Strategy not found: {0}")]
    NotFound(String),
}

/// Market data errors.
///
/// Errors carrying a bar index are fatal to the run that hit them.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    #[error("No data available for the requested range")]
    NoDataAvailable,

    #[error("Bar series is empty")]
    EmptySeries,

    #[error("Non-monotonic timestamp at bar {index}: {current} does not follow {previous}")]
    NonMonotonicTimestamp {
        index: usize,
        previous: i64,
        current: i64,
    },

    #[error("Gap before bar {index}: {current} is more than {limit_ms} ms after {previous}")]
    Gap {
        index: usize,
        previous: i64,
        current: i64,
        limit_ms: i64,
    },

    #[error("Invalid bar at index {index}: {reason}")]
    InvalidBar { index: usize, reason: String },

    #[error("Invalid timeframe: {0}")]
    InvalidTimeframe(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Cache error: {0}")]
    CacheError(String),
}

impl DataError {
    /// Index of the offending bar, if the error is tied to one.
    pub fn bar_index(&self) -> Option<usize> {
        match self {
            DataError::NonMonotonicTimestamp { index, .. }
            | DataError::Gap { index, .. }
            | DataError::InvalidBar { index, .. } => Some(*index),
            DataError::EmptySeries => Some(0),
            _ => None,
        }
    }
}

/// Simulated execution errors. These never fail a run; the bar is skipped.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecutionError {
    #[error("Insufficient cash: required {required}, available {available}")]
    InsufficientCash {
        required: Decimal,
        available: Decimal,
    },

    #[error("Invalid quantity: {quantity}")]
    InvalidQuantity { quantity: Decimal },

    #[error("Invalid fill price: {0}")]
    InvalidPrice(f64),
}

/// Indicator calculation errors.
#[derive(Error, Debug)]
pub enum IndicatorError {
    #[error("Series length mismatch for '{name}': expected {expected}, got {actual}")]
    LengthMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Result type alias.
pub type TradingResult<T> = Result<T, TradingError>;
