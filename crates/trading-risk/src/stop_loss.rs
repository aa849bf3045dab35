//! Stop-loss management.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use trading_core::types::{to_decimal, Bar, PositionSide};

/// Stop-loss calculation method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case", tag = "method")]
pub enum StopLossMethod {
    /// No stop
    #[default]
    None,
    /// Fixed percentage below/above entry
    FixedPercent { percent: Decimal },
    /// Entry price offset by a multiple of ATR at the signal bar
    Atr { multiplier: Decimal },
    /// Trailing stop (percentage of the best close since entry)
    TrailingPercent { percent: Decimal },
}

impl StopLossMethod {
    pub fn is_trailing(&self) -> bool {
        matches!(self, StopLossMethod::TrailingPercent { .. })
    }

    pub fn needs_atr(&self) -> bool {
        matches!(self, StopLossMethod::Atr { .. })
    }

    /// Check the parameters. Returns a description of the problem.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            StopLossMethod::None => Ok(()),
            StopLossMethod::FixedPercent { percent } | StopLossMethod::TrailingPercent { percent } => {
                if *percent <= Decimal::ZERO || *percent >= dec!(100) {
                    Err(format!("stop-loss percent must be in (0, 100), got {}", percent))
                } else {
                    Ok(())
                }
            }
            StopLossMethod::Atr { multiplier } => {
                if *multiplier <= Decimal::ZERO {
                    Err(format!("ATR multiplier must be positive, got {}", multiplier))
                } else {
                    Ok(())
                }
            }
        }
    }
}

/// Stop-loss manager.
#[derive(Debug, Clone)]
pub struct StopLossManager {
    method: StopLossMethod,
}

impl StopLossManager {
    /// Create a new stop-loss manager.
    pub fn new(method: StopLossMethod) -> Self {
        Self { method }
    }

    pub fn method(&self) -> &StopLossMethod {
        &self.method
    }

    fn offset_from(price: Decimal, offset: Decimal, side: PositionSide) -> Option<Decimal> {
        match side {
            PositionSide::Long => Some(price - offset),  // Long: stop below
            PositionSide::Short => Some(price + offset), // Short: stop above
            PositionSide::Flat => None,
        }
    }

    /// Calculate the stop level for a new position.
    ///
    /// ATR stops need the ATR from the bar that produced the entry signal;
    /// without it no stop is set.
    pub fn calculate_stop_price(
        &self,
        entry_price: Decimal,
        side: PositionSide,
        atr: Option<Decimal>,
    ) -> Option<Decimal> {
        match &self.method {
            StopLossMethod::None => None,
            StopLossMethod::FixedPercent { percent }
            | StopLossMethod::TrailingPercent { percent } => {
                let offset = entry_price * (*percent / dec!(100));
                Self::offset_from(entry_price, offset, side)
            }
            StopLossMethod::Atr { multiplier } => {
                let offset = atr? * *multiplier;
                Self::offset_from(entry_price, offset, side)
            }
        }
    }

    /// Ratchet a trailing stop toward the current price. Never loosens it.
    pub fn update_trailing_stop(
        &self,
        current_stop: Decimal,
        current_price: Decimal,
        side: PositionSide,
    ) -> Decimal {
        match &self.method {
            StopLossMethod::TrailingPercent { percent } => {
                let offset = current_price * (*percent / dec!(100));
                match side {
                    // Long: move stop up if price moved up
                    PositionSide::Long => (current_price - offset).max(current_stop),
                    // Short: move stop down if price moved down
                    PositionSide::Short => (current_price + offset).min(current_stop),
                    PositionSide::Flat => current_stop,
                }
            }
            _ => current_stop,
        }
    }

    /// Whether the bar's range reached the stop.
    pub fn is_triggered(
        stop_price: Decimal,
        bar_low: Decimal,
        bar_high: Decimal,
        side: PositionSide,
    ) -> bool {
        match side {
            PositionSide::Long => bar_low <= stop_price,
            PositionSide::Short => bar_high >= stop_price,
            PositionSide::Flat => false,
        }
    }

    /// Same check against a raw bar.
    pub fn is_triggered_by(stop_price: Decimal, bar: &Bar, side: PositionSide) -> bool {
        // Bars are validated before they reach the risk layer
        let low = to_decimal(bar.low).unwrap_or(Decimal::MAX);
        let high = to_decimal(bar.high).unwrap_or(Decimal::ZERO);
        Self::is_triggered(stop_price, low, high, side)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_percent_stop() {
        let manager = StopLossManager::new(StopLossMethod::FixedPercent { percent: dec!(5) });

        let stop = manager
            .calculate_stop_price(dec!(100), PositionSide::Long, None)
            .unwrap();
        assert_eq!(stop, dec!(95)); // 5% below

        let stop = manager
            .calculate_stop_price(dec!(100), PositionSide::Short, None)
            .unwrap();
        assert_eq!(stop, dec!(105)); // 5% above
    }

    #[test]
    fn test_atr_stop() {
        let manager = StopLossManager::new(StopLossMethod::Atr {
            multiplier: dec!(2),
        });

        let stop = manager.calculate_stop_price(dec!(100), PositionSide::Long, Some(dec!(5)));
        assert_eq!(stop, Some(dec!(90))); // 2 * 5 = 10 below

        // ATR still warming up
        assert_eq!(
            manager.calculate_stop_price(dec!(100), PositionSide::Long, None),
            None
        );
    }

    #[test]
    fn test_no_stop() {
        let manager = StopLossManager::new(StopLossMethod::None);
        assert_eq!(
            manager.calculate_stop_price(dec!(100), PositionSide::Long, Some(dec!(1))),
            None
        );
    }

    #[test]
    fn test_trailing_stop_update() {
        let manager = StopLossManager::new(StopLossMethod::TrailingPercent { percent: dec!(5) });

        // Long position, price moved up
        let current_stop = dec!(95);
        let new_stop = manager.update_trailing_stop(current_stop, dec!(110), PositionSide::Long);
        assert_eq!(new_stop, dec!(104.5)); // 5% below 110

        // Price moved down - stop shouldn't move down
        let new_stop2 = manager.update_trailing_stop(new_stop, dec!(105), PositionSide::Long);
        assert_eq!(new_stop2, dec!(104.5));

        // Short position only ratchets down
        let short_stop = manager.update_trailing_stop(dec!(105), dec!(90), PositionSide::Short);
        assert_eq!(short_stop, dec!(94.5));
        let short_stop = manager.update_trailing_stop(short_stop, dec!(99), PositionSide::Short);
        assert_eq!(short_stop, dec!(94.5));
    }

    #[test]
    fn test_stop_triggered() {
        // Long: low reaching the stop triggers
        assert!(StopLossManager::is_triggered(dec!(95), dec!(94), dec!(99), PositionSide::Long));
        assert!(StopLossManager::is_triggered(dec!(95), dec!(95), dec!(99), PositionSide::Long));
        assert!(!StopLossManager::is_triggered(dec!(95), dec!(96), dec!(99), PositionSide::Long));

        // Short: high reaching the stop triggers
        assert!(StopLossManager::is_triggered(dec!(105), dec!(100), dec!(106), PositionSide::Short));
        assert!(!StopLossManager::is_triggered(dec!(105), dec!(100), dec!(104), PositionSide::Short));
    }

    #[test]
    fn test_validate() {
        assert!(StopLossMethod::FixedPercent { percent: dec!(2) }.validate().is_ok());
        assert!(StopLossMethod::FixedPercent { percent: dec!(0) }.validate().is_err());
        assert!(StopLossMethod::Atr { multiplier: dec!(-1) }.validate().is_err());
    }
}
