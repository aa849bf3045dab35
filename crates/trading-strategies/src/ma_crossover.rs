//! Moving Average Crossover Strategy.
//!
//! Goes long when the fast MA crosses above the slow MA, and exits (or
//! shorts) when the fast MA crosses below the slow MA.

use serde::{Deserialize, Serialize};
use trading_core::{
    error::{IndicatorError, StrategyError},
    traits::{Indicator, SignalContext, Strategy, StrategyConfig},
    types::{Bar, IndicatorFrame, Signal},
};
use trading_indicators::{Ema, Sma};

use crate::bearish;

const FAST: &str = "fast_ma";
const SLOW: &str = "slow_ma";

/// Configuration for the MA Crossover strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmaCrossoverConfig {
    /// Fast moving average period
    pub fast_period: usize,
    /// Slow moving average period
    pub slow_period: usize,
    /// Use EMA instead of SMA
    pub use_ema: bool,
    /// Short on a bearish cross instead of only exiting
    pub allow_short: bool,
}

impl Default for SmaCrossoverConfig {
    fn default() -> Self {
        Self {
            fast_period: 50,
            slow_period: 200,
            use_ema: false,
            allow_short: false,
        }
    }
}

impl StrategyConfig for SmaCrossoverConfig {
    fn validate(&self) -> Result<(), StrategyError> {
        if self.fast_period == 0 {
            return Err(StrategyError::InvalidConfig(
                "Fast period must be greater than 0".into(),
            ));
        }
        if self.fast_period >= self.slow_period {
            return Err(StrategyError::InvalidConfig(
                "Fast period must be less than slow period".into(),
            ));
        }
        Ok(())
    }
}

/// Moving Average Crossover Strategy.
#[derive(Debug, Clone)]
pub struct SmaCrossoverStrategy {
    config: SmaCrossoverConfig,
}

impl SmaCrossoverStrategy {
    /// Create a new MA Crossover strategy.
    pub fn new(config: SmaCrossoverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SmaCrossoverConfig {
        &self.config
    }

    fn calculate_ma(&self, closes: &[f64], period: usize) -> Vec<Option<f64>> {
        if self.config.use_ema {
            Ema::new(period).calculate(closes)
        } else {
            Sma::new(period).calculate(closes)
        }
    }
}

impl Strategy for SmaCrossoverStrategy {
    fn name(&self) -> &str {
        "sma_crossover"
    }

    fn description(&self) -> &str {
        "Trades fast/slow moving average crossovers"
    }

    /// The slow MA is first defined at `slow_period - 1`; a cross also needs
    /// the bar before, so decisions start one bar later.
    fn warmup_period(&self) -> usize {
        self.config.slow_period
    }

    fn compute_indicators(&self, bars: &[Bar]) -> Result<IndicatorFrame, IndicatorError> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let mut frame = IndicatorFrame::new(bars.len());
        frame.insert(FAST, self.calculate_ma(&closes, self.config.fast_period))?;
        frame.insert(SLOW, self.calculate_ma(&closes, self.config.slow_period))?;
        Ok(frame)
    }

    fn decide(&self, ctx: &SignalContext<'_>) -> Option<Signal> {
        let fast = ctx.value(FAST)?;
        let slow = ctx.value(SLOW)?;
        let prev_fast = ctx.previous(FAST)?;
        let prev_slow = ctx.previous(SLOW)?;

        let signal = if prev_fast <= prev_slow && fast > slow {
            Signal::Long
        } else if prev_fast >= prev_slow && fast < slow {
            bearish(self.config.allow_short)
        } else {
            Signal::Hold
        };
        Some(signal)
    }
}
