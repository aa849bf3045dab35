//! Simulated order execution with slippage and commission.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use trading_core::{
    error::ExecutionError,
    to_f64,
    types::{ExitReason, Fill, FillReason, Position, PositionSide, Side},
};

/// How far the fill price moves against the order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case", tag = "model")]
pub enum SlippageModel {
    /// Fill at the reference price
    #[default]
    None,
    /// Fixed fraction of the price, in basis points
    BasisPoints { bps: Decimal },
    /// Fixed number of ticks
    Ticks { tick_size: Decimal, ticks: u32 },
}

impl SlippageModel {
    /// Price offset for one unit at `reference`.
    pub fn offset(&self, reference: Decimal) -> Decimal {
        match self {
            SlippageModel::None => Decimal::ZERO,
            SlippageModel::BasisPoints { bps } => reference * *bps / dec!(10000),
            SlippageModel::Ticks { tick_size, ticks } => *tick_size * Decimal::from(*ticks),
        }
    }

    /// Buys fill higher, sells fill lower.
    pub fn apply(&self, reference: Decimal, side: Side) -> Decimal {
        let offset = self.offset(reference);
        match side {
            Side::Buy => reference + offset,
            Side::Sell => reference - offset,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        match self {
            SlippageModel::None => Ok(()),
            SlippageModel::BasisPoints { bps } if *bps < Decimal::ZERO => {
                Err(format!("slippage basis points must not be negative, got {}", bps))
            }
            SlippageModel::Ticks { tick_size, .. } if *tick_size < Decimal::ZERO => {
                Err(format!("tick size must not be negative, got {}", tick_size))
            }
            _ => Ok(()),
        }
    }
}

/// Fixed fee plus a percentage of notional, charged on every fill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CommissionModel {
    pub fixed: Decimal,
    /// Percent of notional (0.1 = 0.1%)
    pub percent: Decimal,
}

impl CommissionModel {
    pub fn calculate(&self, notional: Decimal) -> Decimal {
        self.fixed + notional.abs() * self.percent / dec!(100)
    }

    pub fn is_free(&self) -> bool {
        self.fixed.is_zero() && self.percent.is_zero()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.fixed < Decimal::ZERO || self.percent < Decimal::ZERO {
            Err(format!(
                "commission must not be negative, got fixed {} percent {}",
                self.fixed, self.percent
            ))
        } else {
            Ok(())
        }
    }
}

/// Turns approved actions into fills.
///
/// Pure with respect to the ledger: it reads cash to size entries but never
/// mutates it.
#[derive(Debug, Clone)]
pub struct ExecutionSimulator {
    slippage: SlippageModel,
    commission: CommissionModel,
    min_quantity: Decimal,
}

impl ExecutionSimulator {
    pub fn new(slippage: SlippageModel, commission: CommissionModel) -> Self {
        Self {
            slippage,
            commission,
            min_quantity: Decimal::ONE,
        }
    }

    /// Smallest entry that will be filled.
    pub fn with_min_quantity(mut self, min_quantity: Decimal) -> Self {
        self.min_quantity = min_quantity;
        self
    }

    pub fn slippage(&self) -> &SlippageModel {
        &self.slippage
    }

    pub fn commission(&self) -> &CommissionModel {
        &self.commission
    }

    fn fill_price(&self, reference: Decimal, side: Side) -> Result<Decimal, ExecutionError> {
        let price = self.slippage.apply(reference, side);
        if price <= Decimal::ZERO {
            return Err(ExecutionError::InvalidPrice(to_f64(price)));
        }
        Ok(price)
    }

    /// Largest whole quantity whose cost plus commission fits in `cash`.
    fn affordable_quantity(&self, price: Decimal, cash: Decimal) -> Decimal {
        let unit_cost = price * (Decimal::ONE + self.commission.percent / dec!(100));
        if unit_cost <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        ((cash - self.commission.fixed) / unit_cost)
            .floor()
            .max(Decimal::ZERO)
    }

    /// Fill opening `side` at `reference_price`.
    ///
    /// `quantity` is the sizer's request; it is trimmed so cost plus
    /// commission stays within `cash`. Short entries are held to the same
    /// cash cover as long ones.
    pub fn entry_fill(
        &self,
        bar_index: usize,
        timestamp: i64,
        side: PositionSide,
        reference_price: Decimal,
        quantity: Decimal,
        cash: Decimal,
    ) -> Result<Fill, ExecutionError> {
        let order_side = side
            .entry_side()
            .ok_or(ExecutionError::InvalidQuantity { quantity })?;
        if quantity < self.min_quantity || quantity <= Decimal::ZERO {
            return Err(ExecutionError::InvalidQuantity { quantity });
        }

        let price = self.fill_price(reference_price, order_side)?;
        let quantity = quantity.min(self.affordable_quantity(price, cash));
        if quantity < self.min_quantity || quantity <= Decimal::ZERO {
            let min = self.min_quantity.max(Decimal::ONE);
            return Err(ExecutionError::InsufficientCash {
                required: min * price + self.commission.calculate(min * price),
                available: cash,
            });
        }

        let notional = quantity * price;
        Ok(Fill {
            bar_index,
            timestamp,
            side: order_side,
            position_side: side,
            quantity,
            reference_price,
            price,
            slippage: (price - reference_price).abs() * quantity,
            commission: self.commission.calculate(notional),
            reason: FillReason::Entry,
        })
    }

    /// Fill closing the whole of `position` at `reference_price`.
    pub fn exit_fill(
        &self,
        bar_index: usize,
        timestamp: i64,
        position: &Position,
        reference_price: Decimal,
        reason: ExitReason,
    ) -> Result<Fill, ExecutionError> {
        let order_side = position.side.exit_side().ok_or(ExecutionError::InvalidQuantity {
            quantity: position.quantity,
        })?;
        let price = self.fill_price(reference_price, order_side)?;
        let notional = position.quantity * price;

        Ok(Fill {
            bar_index,
            timestamp,
            side: order_side,
            position_side: position.side,
            quantity: position.quantity,
            reference_price,
            price,
            slippage: (price - reference_price).abs() * position.quantity,
            commission: self.commission.calculate(notional),
            reason: FillReason::Exit(reason),
        })
    }
}

impl Default for ExecutionSimulator {
    fn default() -> Self {
        Self::new(SlippageModel::None, CommissionModel::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn long_position(quantity: Decimal, entry: Decimal) -> Position {
        Position {
            side: PositionSide::Long,
            quantity,
            entry_price: entry,
            entry_index: 0,
            entry_timestamp: 0,
            entry_commission: Decimal::ZERO,
            entry_slippage: Decimal::ZERO,
        }
    }

    #[test]
    fn test_slippage_models() {
        let bps = SlippageModel::BasisPoints { bps: dec!(10) };
        assert_eq!(bps.apply(dec!(100), Side::Buy), dec!(100.1));
        assert_eq!(bps.apply(dec!(100), Side::Sell), dec!(99.9));

        let ticks = SlippageModel::Ticks {
            tick_size: dec!(0.01),
            ticks: 2,
        };
        assert_eq!(ticks.apply(dec!(50), Side::Buy), dec!(50.02));
        assert_eq!(ticks.apply(dec!(50), Side::Sell), dec!(49.98));

        assert_eq!(SlippageModel::None.apply(dec!(50), Side::Buy), dec!(50));
    }

    #[test]
    fn test_commission() {
        let commission = CommissionModel {
            fixed: dec!(1),
            percent: dec!(0.1),
        };
        assert_eq!(commission.calculate(dec!(10000)), dec!(11));
        assert!(CommissionModel::default().is_free());
    }

    #[test]
    fn test_entry_fill_trims_to_cash() {
        let sim = ExecutionSimulator::new(
            SlippageModel::None,
            CommissionModel {
                fixed: dec!(5),
                percent: Decimal::ZERO,
            },
        );

        // 100 units at 100 would cost 10005 with commission
        let fill = sim
            .entry_fill(3, 1000, PositionSide::Long, dec!(100), dec!(100), dec!(10000))
            .unwrap();
        assert_eq!(fill.quantity, dec!(99));
        assert_eq!(fill.side, Side::Buy);
        assert_eq!(fill.commission, dec!(5));
        assert_eq!(fill.reason, FillReason::Entry);
        assert!(fill.notional() + fill.commission <= dec!(10000));
    }

    #[test]
    fn test_entry_rejections() {
        let sim = ExecutionSimulator::default();

        assert!(matches!(
            sim.entry_fill(0, 0, PositionSide::Long, dec!(100), dec!(10), dec!(50)),
            Err(ExecutionError::InsufficientCash { .. })
        ));
        assert!(matches!(
            sim.entry_fill(0, 0, PositionSide::Long, dec!(100), dec!(0), dec!(5000)),
            Err(ExecutionError::InvalidQuantity { .. })
        ));
        assert!(matches!(
            sim.entry_fill(0, 0, PositionSide::Flat, dec!(100), dec!(1), dec!(5000)),
            Err(ExecutionError::InvalidQuantity { .. })
        ));
    }

    #[test]
    fn test_short_entry_sells() {
        let sim = ExecutionSimulator::new(
            SlippageModel::BasisPoints { bps: dec!(100) },
            CommissionModel::default(),
        );
        let fill = sim
            .entry_fill(1, 0, PositionSide::Short, dec!(100), dec!(10), dec!(10000))
            .unwrap();
        assert_eq!(fill.side, Side::Sell);
        assert_eq!(fill.price, dec!(99));
        assert_eq!(fill.slippage, dec!(10));
    }

    #[test]
    fn test_exit_fill() {
        let sim = ExecutionSimulator::new(
            SlippageModel::BasisPoints { bps: dec!(50) },
            CommissionModel {
                fixed: Decimal::ZERO,
                percent: dec!(0.1),
            },
        );
        let fill = sim
            .exit_fill(9, 9000, &long_position(dec!(10), dec!(90)), dec!(100), ExitReason::StopLoss)
            .unwrap();

        assert_eq!(fill.side, Side::Sell);
        assert_eq!(fill.price, dec!(99.5));
        assert_eq!(fill.quantity, dec!(10));
        assert_eq!(fill.commission, dec!(0.995));
        assert_eq!(fill.reason, FillReason::Exit(ExitReason::StopLoss));
    }
}
