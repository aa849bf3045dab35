//! Core data types for the backtester.

mod frame;
mod money;
mod ohlcv;
mod position;
mod signal;
mod timeframe;
mod trade;

pub use frame::IndicatorFrame;
pub use money::{to_decimal, to_f64};
pub use ohlcv::{Bar, BarSeries};
pub use position::{Position, PositionSide, Side};
pub use signal::Signal;
pub use timeframe::Timeframe;
pub use trade::{EquityPoint, ExitReason, Fill, FillReason, Trade};
