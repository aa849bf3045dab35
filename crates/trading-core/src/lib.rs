//! Core types and traits for the backtester.
//!
//! This crate provides the foundational building blocks including:
//! - Market data types (Bar, BarSeries, Timeframe)
//! - Signals, positions, fills and closed trades
//! - Aligned indicator frames
//! - Core traits for strategies, indicators and data sources

pub mod types;
pub mod traits;
pub mod error;

pub use error::{TradingError, TradingResult};
pub use types::*;
pub use traits::*;
