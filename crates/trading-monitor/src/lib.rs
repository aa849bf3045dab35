//! Logging setup for the backtester.

mod logging;

pub use logging::{setup_logging, LogFormat, LoggingGuard};
