//! Technical indicators with SIMD optimization.
//!
//! This crate provides the indicator library used by the strategies:
//! - Moving averages (SMA, EMA)
//! - Momentum indicators (RSI, MACD, ROC)
//! - Volatility indicators (ATR, Bollinger Bands, Standard Deviation)
//!
//! Every indicator returns one entry per input value. Entries inside the
//! warm-up window are `None` rather than a placeholder number, so callers
//! cannot act on insufficient history by accident.

pub mod momentum;
pub mod moving_average;
pub mod simd;
pub mod volatility;

pub use momentum::{Macd, MacdOutput, Roc, Rsi};
pub use moving_average::{Ema, Sma};
pub use volatility::{Atr, BollingerBands, BollingerOutput, StdDev};
