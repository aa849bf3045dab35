//! Momentum/Trend Following Strategy.
//!
//! Goes long when the trailing return over the lookback window exceeds a
//! positive threshold, and exits once it falls below the exit threshold.
//! An optional MACD histogram filter confirms entries.

use serde::{Deserialize, Serialize};
use trading_core::{
    error::{IndicatorError, StrategyError},
    traits::{Indicator, MultiOutputIndicator, SignalContext, Strategy, StrategyConfig},
    types::{Bar, IndicatorFrame, PositionSide, Signal},
};
use trading_indicators::{Macd, Roc};

const ROC: &str = "roc";
const MACD_HIST: &str = "macd_histogram";

/// Configuration for the Momentum strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MomentumConfig {
    /// Momentum lookback period in bars
    pub lookback: usize,
    /// Minimum trailing return to enter (0.02 = 2%)
    pub entry_threshold: f64,
    /// Exit a long once the trailing return drops below this
    pub exit_threshold: f64,
    /// Require a positive MACD histogram for longs (negative for shorts)
    pub macd_confirmation: bool,
    /// MACD periods used for confirmation
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    /// Allow short positions
    pub allow_short: bool,
}

impl Default for MomentumConfig {
    fn default() -> Self {
        Self {
            lookback: 14,
            entry_threshold: 0.02,
            exit_threshold: 0.0,
            macd_confirmation: false,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            allow_short: false,
        }
    }
}

impl StrategyConfig for MomentumConfig {
    fn validate(&self) -> Result<(), StrategyError> {
        if self.lookback == 0 {
            return Err(StrategyError::InvalidConfig(
                "Lookback must be greater than 0".into(),
            ));
        }
        if !self.entry_threshold.is_finite() || self.entry_threshold <= 0.0 {
            return Err(StrategyError::InvalidConfig(
                "Entry threshold must be positive".into(),
            ));
        }
        if !self.exit_threshold.is_finite() || self.exit_threshold >= self.entry_threshold {
            return Err(StrategyError::InvalidConfig(
                "Exit threshold must be below the entry threshold".into(),
            ));
        }
        if self.macd_confirmation {
            if self.macd_fast == 0 || self.macd_signal == 0 {
                return Err(StrategyError::InvalidConfig(
                    "MACD periods must be greater than 0".into(),
                ));
            }
            if self.macd_fast >= self.macd_slow {
                return Err(StrategyError::InvalidConfig(
                    "MACD fast period must be less than slow period".into(),
                ));
            }
        }
        Ok(())
    }
}

/// Momentum Strategy.
#[derive(Debug, Clone)]
pub struct MomentumStrategy {
    config: MomentumConfig,
}

impl MomentumStrategy {
    /// Create a new Momentum strategy.
    pub fn new(config: MomentumConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MomentumConfig {
        &self.config
    }

    fn macd(&self) -> Macd {
        Macd::with_periods(
            self.config.macd_fast,
            self.config.macd_slow,
            self.config.macd_signal,
        )
    }

    /// Whether the MACD filter agrees with an entry in `direction`.
    fn confirmed(&self, ctx: &SignalContext<'_>, direction: PositionSide) -> Option<bool> {
        if !self.config.macd_confirmation {
            return Some(true);
        }
        let histogram = ctx.value(MACD_HIST)?;
        Some(match direction {
            PositionSide::Long => histogram > 0.0,
            PositionSide::Short => histogram < 0.0,
            PositionSide::Flat => false,
        })
    }
}

impl Strategy for MomentumStrategy {
    fn name(&self) -> &str {
        "momentum"
    }

    fn description(&self) -> &str {
        "Follows trailing returns over a lookback window"
    }

    fn warmup_period(&self) -> usize {
        if self.config.macd_confirmation {
            self.config.lookback.max(self.macd().warmup())
        } else {
            self.config.lookback
        }
    }

    fn compute_indicators(&self, bars: &[Bar]) -> Result<IndicatorFrame, IndicatorError> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let mut frame = IndicatorFrame::new(bars.len());
        frame.insert(ROC, Roc::new(self.config.lookback).calculate(&closes))?;
        if self.config.macd_confirmation {
            let histogram = self
                .macd()
                .calculate(&closes)
                .into_iter()
                .map(|o| o.map(|o| o.histogram))
                .collect();
            frame.insert(MACD_HIST, histogram)?;
        }
        Ok(frame)
    }

    fn decide(&self, ctx: &SignalContext<'_>) -> Option<Signal> {
        let roc = ctx.value(ROC)?;
        let cfg = &self.config;

        let signal = match ctx.position {
            PositionSide::Flat => {
                if roc > cfg.entry_threshold && self.confirmed(ctx, PositionSide::Long)? {
                    Signal::Long
                } else if cfg.allow_short
                    && roc < -cfg.entry_threshold
                    && self.confirmed(ctx, PositionSide::Short)?
                {
                    Signal::Short
                } else {
                    Signal::Hold
                }
            }
            PositionSide::Long if roc < cfg.exit_threshold => {
                if cfg.allow_short && roc < -cfg.entry_threshold {
                    Signal::Short
                } else {
                    Signal::Exit
                }
            }
            PositionSide::Short if roc > -cfg.exit_threshold => {
                if roc > cfg.entry_threshold {
                    Signal::Long
                } else {
                    Signal::Exit
                }
            }
            _ => Signal::Hold,
        };
        Some(signal)
    }
}
