//! Strategy registry for dynamic strategy loading.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;
use trading_core::{error::StrategyError, traits::Strategy};

use crate::{MeanReversionConfig, MomentumConfig, RsiConfig, SmaCrossoverConfig, StrategySpec};

/// Information about a registered strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyInfo {
    /// Registry key
    pub name: String,
    /// Strategy description
    pub description: String,
    /// Default configuration as JSON
    pub default_config: serde_json::Value,
}

/// Registry for available trading strategies.
pub struct StrategyRegistry {
    strategies: BTreeMap<String, StrategyInfo>,
}

impl StrategyRegistry {
    /// Create a new strategy registry with all built-in strategies.
    pub fn new() -> Self {
        let mut registry = Self {
            strategies: BTreeMap::new(),
        };

        registry.register(
            "sma_crossover",
            "Trades fast/slow moving average crossovers",
            serde_json::to_value(SmaCrossoverConfig::default()),
        );
        registry.register(
            "momentum",
            "Follows trailing returns over a lookback window",
            serde_json::to_value(MomentumConfig::default()),
        );
        registry.register(
            "mean_reversion",
            "Trades reversions to the mean using Bollinger Bands",
            serde_json::to_value(MeanReversionConfig::default()),
        );
        registry.register(
            "rsi",
            "Trades RSI overbought/oversold reversals",
            serde_json::to_value(RsiConfig::default()),
        );

        registry
    }

    fn register(
        &mut self,
        name: &str,
        description: &str,
        default_config: Result<serde_json::Value, serde_json::Error>,
    ) {
        self.strategies.insert(
            name.to_string(),
            StrategyInfo {
                name: name.to_string(),
                description: description.to_string(),
                default_config: default_config.unwrap_or_default(),
            },
        );
    }

    /// List all available strategies, sorted by name.
    pub fn list(&self) -> Vec<&StrategyInfo> {
        self.strategies.values().collect()
    }

    /// Get strategy info by name.
    pub fn get(&self, name: &str) -> Option<&StrategyInfo> {
        self.strategies.get(name)
    }

    /// Check if a strategy exists.
    pub fn exists(&self, name: &str) -> bool {
        self.strategies.contains_key(name)
    }

    /// Get all strategy names.
    pub fn names(&self) -> Vec<&str> {
        self.strategies.keys().map(|k| k.as_str()).collect()
    }

    /// Resolve a name and JSON parameters into a validated spec.
    pub fn spec(&self, name: &str, config: serde_json::Value) -> Result<StrategySpec, StrategyError> {
        let spec = StrategySpec::from_name(name, config)?;
        spec.validate()?;
        debug!(strategy = name, "Resolved strategy parameters");
        Ok(spec)
    }

    /// Create a strategy instance from configuration.
    pub fn create(
        &self,
        name: &str,
        config: serde_json::Value,
    ) -> Result<Box<dyn Strategy>, StrategyError> {
        self.spec(name, config)?.build()
    }

    /// Create a strategy with default configuration.
    pub fn create_default(&self, name: &str) -> Result<Box<dyn Strategy>, StrategyError> {
        let info = self
            .get(name)
            .ok_or_else(|| StrategyError::NotFound(name.to_string()))?;
        self.create(name, info.default_config.clone())
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_list() {
        let registry = StrategyRegistry::new();
        let strategies = registry.list();

        assert_eq!(strategies.len(), 4);
        assert_eq!(
            registry.names(),
            vec!["mean_reversion", "momentum", "rsi", "sma_crossover"]
        );
    }

    #[test]
    fn test_registry_get() {
        let registry = StrategyRegistry::new();

        assert!(registry.get("sma_crossover").is_some());
        assert!(registry.exists("rsi"));
        assert!(registry.get("unknown").is_none());
    }

    #[test]
    fn test_create_default() {
        let registry = StrategyRegistry::new();

        for name in registry.names() {
            let strategy = registry.create_default(name).unwrap();
            assert_eq!(strategy.name(), name);
        }
    }

    #[test]
    fn test_create_with_config() {
        let registry = StrategyRegistry::new();

        let config = serde_json::json!({
            "fast_period": 5,
            "slow_period": 10,
            "use_ema": true
        });

        let strategy = registry.create("sma_crossover", config).unwrap();
        assert_eq!(strategy.warmup_period(), 10);
    }

    #[test]
    fn test_create_rejects_bad_input() {
        let registry = StrategyRegistry::new();

        assert!(matches!(
            registry.create_default("unknown"),
            Err(StrategyError::NotFound(_))
        ));
        assert!(matches!(
            registry.create("rsi", serde_json::json!({"period": "fourteen"})),
            Err(StrategyError::InvalidConfig(_))
        ));
    }
}
