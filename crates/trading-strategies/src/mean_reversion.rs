//! Mean Reversion Strategy using Bollinger Bands.
//!
//! Buys when the close drops below the lower band and exits once price
//! reverts to the middle band. The short side mirrors this at the upper band.

use serde::{Deserialize, Serialize};
use trading_core::{
    error::{IndicatorError, StrategyError},
    traits::{MultiOutputIndicator, SignalContext, Strategy, StrategyConfig},
    types::{Bar, IndicatorFrame, PositionSide, Signal},
};
use trading_indicators::BollingerBands;

const UPPER: &str = "bb_upper";
const MIDDLE: &str = "bb_middle";
const LOWER: &str = "bb_lower";

/// Configuration for the Mean Reversion strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeanReversionConfig {
    /// Rolling window for the mean and standard deviation
    pub period: usize,
    /// Band width in standard deviations
    pub num_std_dev: f64,
    /// Short above the upper band
    pub allow_short: bool,
}

impl Default for MeanReversionConfig {
    fn default() -> Self {
        Self {
            period: 50,
            num_std_dev: 2.0,
            allow_short: false,
        }
    }
}

impl StrategyConfig for MeanReversionConfig {
    fn validate(&self) -> Result<(), StrategyError> {
        if self.period < 2 {
            return Err(StrategyError::InvalidConfig(
                "Period must be at least 2".into(),
            ));
        }
        if !self.num_std_dev.is_finite() || self.num_std_dev <= 0.0 {
            return Err(StrategyError::InvalidConfig(
                "Std dev multiplier must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Mean Reversion Strategy.
#[derive(Debug, Clone)]
pub struct MeanReversionStrategy {
    config: MeanReversionConfig,
}

impl MeanReversionStrategy {
    /// Create a new Mean Reversion strategy.
    pub fn new(config: MeanReversionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MeanReversionConfig {
        &self.config
    }
}

impl Strategy for MeanReversionStrategy {
    fn name(&self) -> &str {
        "mean_reversion"
    }

    fn description(&self) -> &str {
        "Trades reversions to the mean using Bollinger Bands"
    }

    fn warmup_period(&self) -> usize {
        self.config.period - 1
    }

    fn compute_indicators(&self, bars: &[Bar]) -> Result<IndicatorFrame, IndicatorError> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let bands = BollingerBands::with_params(self.config.period, self.config.num_std_dev)
            .calculate(&closes);

        let mut frame = IndicatorFrame::new(bars.len());
        frame.insert(UPPER, bands.iter().map(|b| b.map(|b| b.upper)).collect())?;
        frame.insert(MIDDLE, bands.iter().map(|b| b.map(|b| b.middle)).collect())?;
        frame.insert(LOWER, bands.iter().map(|b| b.map(|b| b.lower)).collect())?;
        Ok(frame)
    }

    fn decide(&self, ctx: &SignalContext<'_>) -> Option<Signal> {
        let close = ctx.bar().close;
        let upper = ctx.value(UPPER)?;
        let middle = ctx.value(MIDDLE)?;
        let lower = ctx.value(LOWER)?;

        let signal = match ctx.position {
            PositionSide::Flat if close < lower => Signal::Long,
            PositionSide::Flat if self.config.allow_short && close > upper => Signal::Short,
            PositionSide::Long if close >= middle => Signal::Exit,
            PositionSide::Short if close <= middle => Signal::Exit,
            _ => Signal::Hold,
        };
        Some(signal)
    }
}
