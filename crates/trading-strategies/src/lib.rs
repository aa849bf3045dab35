//! Trading strategy implementations.
//!
//! This crate provides the strategy variants driven by the backtest engine:
//! - SMA/EMA Crossover
//! - Momentum (rate of change, optional MACD confirmation)
//! - Mean Reversion (Bollinger Bands)
//! - RSI-based trading
//!
//! Strategies compute their indicators once per series and decide per bar
//! from the precomputed frame, so signals are pure functions of their inputs.

mod ma_crossover;
mod mean_reversion;
mod momentum;
mod registry;
mod rsi_strategy;
mod spec;

pub use ma_crossover::{SmaCrossoverConfig, SmaCrossoverStrategy};
pub use mean_reversion::{MeanReversionConfig, MeanReversionStrategy};
pub use momentum::{MomentumConfig, MomentumStrategy};
pub use registry::{StrategyInfo, StrategyRegistry};
pub use rsi_strategy::{RsiConfig, RsiStrategy};
pub use spec::StrategySpec;

use trading_core::Signal;

/// Signal for a bearish event: short when allowed, otherwise just exit.
pub(crate) fn bearish(allow_short: bool) -> Signal {
    if allow_short {
        Signal::Short
    } else {
        Signal::Exit
    }
}
