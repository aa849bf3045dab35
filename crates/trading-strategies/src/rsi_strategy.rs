//! RSI-based Trading Strategy.
//!
//! Goes long when RSI dips to the oversold level and crosses back above it,
//! and exits (or shorts) when RSI crosses back below the overbought level.

use serde::{Deserialize, Serialize};
use trading_core::{
    error::{IndicatorError, StrategyError},
    traits::{Indicator, SignalContext, Strategy, StrategyConfig},
    types::{Bar, IndicatorFrame, Signal},
};
use trading_indicators::Rsi;

use crate::bearish;

const RSI: &str = "rsi";

/// Configuration for the RSI strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RsiConfig {
    /// RSI calculation period
    pub period: usize,
    /// Overbought threshold
    pub overbought: f64,
    /// Oversold threshold
    pub oversold: f64,
    /// Allow short positions
    pub allow_short: bool,
}

impl Default for RsiConfig {
    fn default() -> Self {
        Self {
            period: 14,
            overbought: 70.0,
            oversold: 30.0,
            allow_short: false,
        }
    }
}

impl StrategyConfig for RsiConfig {
    fn validate(&self) -> Result<(), StrategyError> {
        if self.period < 2 {
            return Err(StrategyError::InvalidConfig(
                "RSI period must be at least 2".into(),
            ));
        }
        if self.overbought <= self.oversold {
            return Err(StrategyError::InvalidConfig(
                "Overbought must be greater than oversold".into(),
            ));
        }
        if self.overbought > 100.0 || self.oversold < 0.0 {
            return Err(StrategyError::InvalidConfig(
                "RSI thresholds must be between 0 and 100".into(),
            ));
        }
        Ok(())
    }
}

/// RSI-based Trading Strategy.
#[derive(Debug, Clone)]
pub struct RsiStrategy {
    config: RsiConfig,
}

impl RsiStrategy {
    /// Create a new RSI strategy.
    pub fn new(config: RsiConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RsiConfig {
        &self.config
    }
}

impl Strategy for RsiStrategy {
    fn name(&self) -> &str {
        "rsi"
    }

    fn description(&self) -> &str {
        "Trades RSI overbought/oversold reversals"
    }

    /// RSI is defined from `period`; a cross also needs the previous value.
    fn warmup_period(&self) -> usize {
        self.config.period + 1
    }

    fn compute_indicators(&self, bars: &[Bar]) -> Result<IndicatorFrame, IndicatorError> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let mut frame = IndicatorFrame::new(bars.len());
        frame.insert(RSI, Rsi::new(self.config.period).calculate(&closes))?;
        Ok(frame)
    }

    fn decide(&self, ctx: &SignalContext<'_>) -> Option<Signal> {
        let rsi = ctx.value(RSI)?;
        let prev = ctx.previous(RSI)?;

        let signal = if prev <= self.config.oversold && rsi > self.config.oversold {
            Signal::Long
        } else if prev >= self.config.overbought && rsi < self.config.overbought {
            bearish(self.config.allow_short)
        } else {
            Signal::Hold
        };
        Some(signal)
    }
}
