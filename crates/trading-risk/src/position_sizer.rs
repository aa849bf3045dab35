//! Position sizing algorithms.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Position sizing method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case", tag = "method")]
pub enum PositionSizingMethod {
    /// Spend all available cash
    #[default]
    AllCash,
    /// Percentage of current equity
    PercentEquity { percent: Decimal },
    /// Fixed number of units
    FixedUnits { units: Decimal },
    /// Fixed notional amount
    FixedNotional { amount: Decimal },
}

impl PositionSizingMethod {
    /// Check the parameters. Returns a description of the problem.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            PositionSizingMethod::AllCash => Ok(()),
            PositionSizingMethod::PercentEquity { percent } => {
                if *percent <= Decimal::ZERO || *percent > dec!(100) {
                    Err(format!("percent of equity must be in (0, 100], got {}", percent))
                } else {
                    Ok(())
                }
            }
            PositionSizingMethod::FixedUnits { units } => {
                if *units <= Decimal::ZERO {
                    Err(format!("fixed units must be positive, got {}", units))
                } else {
                    Ok(())
                }
            }
            PositionSizingMethod::FixedNotional { amount } => {
                if *amount <= Decimal::ZERO {
                    Err(format!("fixed notional must be positive, got {}", amount))
                } else {
                    Ok(())
                }
            }
        }
    }
}

/// Position sizer calculates the appropriate position size.
///
/// Sizes are whole units. Costs are not included here; the execution layer
/// trims the quantity further if commission would overdraw cash.
#[derive(Debug, Clone)]
pub struct PositionSizer {
    method: PositionSizingMethod,
    max_units: Option<Decimal>,
}

impl PositionSizer {
    /// Create a new position sizer.
    pub fn new(method: PositionSizingMethod) -> Self {
        Self {
            method,
            max_units: None,
        }
    }

    /// Set maximum units per position.
    pub fn with_max_units(mut self, max: Decimal) -> Self {
        self.max_units = Some(max);
        self
    }

    pub fn method(&self) -> &PositionSizingMethod {
        &self.method
    }

    /// Calculate position size.
    pub fn calculate(&self, cash: Decimal, equity: Decimal, price: Decimal) -> Decimal {
        if price <= Decimal::ZERO {
            return Decimal::ZERO;
        }

        let size = match &self.method {
            PositionSizingMethod::AllCash => cash / price,
            PositionSizingMethod::PercentEquity { percent } => {
                equity * (*percent / dec!(100)) / price
            }
            PositionSizingMethod::FixedUnits { units } => *units,
            PositionSizingMethod::FixedNotional { amount } => *amount / price,
        };

        let size = size.floor().max(Decimal::ZERO);
        match self.max_units {
            Some(max) => size.min(max),
            None => size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_cash() {
        let sizer = PositionSizer::new(PositionSizingMethod::AllCash);
        assert_eq!(sizer.calculate(dec!(10000), dec!(10000), dec!(99)), dec!(101));
    }

    #[test]
    fn test_percent_equity() {
        let sizer = PositionSizer::new(PositionSizingMethod::PercentEquity { percent: dec!(10) });
        // 10% of 50000 = 5000 / 100 = 50 units
        assert_eq!(sizer.calculate(dec!(20000), dec!(50000), dec!(100)), dec!(50));
    }

    #[test]
    fn test_fixed_methods() {
        let units = PositionSizer::new(PositionSizingMethod::FixedUnits { units: dec!(7) });
        assert_eq!(units.calculate(dec!(1), dec!(1), dec!(100)), dec!(7));

        let notional =
            PositionSizer::new(PositionSizingMethod::FixedNotional { amount: dec!(1000) });
        assert_eq!(notional.calculate(dec!(0), dec!(0), dec!(300)), dec!(3));
    }

    #[test]
    fn test_max_units_and_bad_price() {
        let sizer = PositionSizer::new(PositionSizingMethod::AllCash).with_max_units(dec!(10));
        assert_eq!(sizer.calculate(dec!(10000), dec!(10000), dec!(1)), dec!(10));
        assert_eq!(sizer.calculate(dec!(10000), dec!(10000), dec!(0)), dec!(0));
    }

    #[test]
    fn test_validate() {
        assert!(PositionSizingMethod::AllCash.validate().is_ok());
        assert!(PositionSizingMethod::PercentEquity { percent: dec!(150) }
            .validate()
            .is_err());
        assert!(PositionSizingMethod::FixedUnits { units: dec!(0) }
            .validate()
            .is_err());
    }
}
