//! Serializable strategy selection.

use serde::{Deserialize, Serialize};
use trading_core::{
    error::StrategyError,
    traits::{Strategy, StrategyConfig},
};

use crate::{
    MeanReversionConfig, MeanReversionStrategy, MomentumConfig, MomentumStrategy, RsiConfig,
    RsiStrategy, SmaCrossoverConfig, SmaCrossoverStrategy,
};

/// One of the built-in strategies together with its parameters.
///
/// Plain data, so it can be cloned into worker threads and read from
/// configuration files:
///
/// ```toml
/// type = "sma_crossover"
/// fast_period = 5
/// slow_period = 20
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StrategySpec {
    SmaCrossover(SmaCrossoverConfig),
    Momentum(MomentumConfig),
    MeanReversion(MeanReversionConfig),
    Rsi(RsiConfig),
}

impl StrategySpec {
    /// Registry name of the variant.
    pub fn name(&self) -> &'static str {
        match self {
            StrategySpec::SmaCrossover(_) => "sma_crossover",
            StrategySpec::Momentum(_) => "momentum",
            StrategySpec::MeanReversion(_) => "mean_reversion",
            StrategySpec::Rsi(_) => "rsi",
        }
    }

    /// Check the parameters without building anything.
    pub fn validate(&self) -> Result<(), StrategyError> {
        match self {
            StrategySpec::SmaCrossover(c) => c.validate(),
            StrategySpec::Momentum(c) => c.validate(),
            StrategySpec::MeanReversion(c) => c.validate(),
            StrategySpec::Rsi(c) => c.validate(),
        }
    }

    /// Validate and instantiate the strategy.
    pub fn build(&self) -> Result<Box<dyn Strategy>, StrategyError> {
        self.validate()?;
        let strategy: Box<dyn Strategy> = match self {
            StrategySpec::SmaCrossover(c) => Box::new(SmaCrossoverStrategy::new(c.clone())),
            StrategySpec::Momentum(c) => Box::new(MomentumStrategy::new(c.clone())),
            StrategySpec::MeanReversion(c) => Box::new(MeanReversionStrategy::new(c.clone())),
            StrategySpec::Rsi(c) => Box::new(RsiStrategy::new(c.clone())),
        };
        Ok(strategy)
    }

    /// Parse parameters for the strategy called `name`.
    pub fn from_name(name: &str, params: serde_json::Value) -> Result<Self, StrategyError> {
        // Missing params mean "use the defaults"
        let params = if params.is_null() {
            serde_json::json!({})
        } else {
            params
        };
        let parse_err = |e: serde_json::Error| StrategyError::InvalidConfig(e.to_string());

        let spec = match name {
            "sma_crossover" | "ma_crossover" => {
                StrategySpec::SmaCrossover(serde_json::from_value(params).map_err(parse_err)?)
            }
            "momentum" => StrategySpec::Momentum(serde_json::from_value(params).map_err(parse_err)?),
            "mean_reversion" => {
                StrategySpec::MeanReversion(serde_json::from_value(params).map_err(parse_err)?)
            }
            "rsi" => StrategySpec::Rsi(serde_json::from_value(params).map_err(parse_err)?),
            _ => return Err(StrategyError::NotFound(name.to_string())),
        };
        Ok(spec)
    }
}

impl Default for StrategySpec {
    fn default() -> Self {
        StrategySpec::SmaCrossover(SmaCrossoverConfig::default())
    }
}
