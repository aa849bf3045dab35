//! Core traits for the backtester.

mod data_source;
mod indicator;
mod strategy;

pub use data_source::DataSource;
pub use indicator::{validate_period, Indicator, MultiOutputIndicator, OhlcvIndicator};
pub use strategy::{SignalContext, Strategy, StrategyConfig};
