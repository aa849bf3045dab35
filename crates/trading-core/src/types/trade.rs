//! Fills, closed trades and equity points.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{PositionSide, Side};

/// Why a position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    /// Strategy asked to exit or reverse
    Signal,
    /// Stop-loss level breached
    StopLoss,
    /// Portfolio drawdown limit forced the exit
    Drawdown,
    /// Liquidated at the end of the data
    EndOfData,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExitReason::Signal => "signal",
            ExitReason::StopLoss => "stop_loss",
            ExitReason::Drawdown => "drawdown",
            ExitReason::EndOfData => "end_of_data",
        };
        write!(f, "{}", s)
    }
}

/// Purpose of a fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "reason")]
pub enum FillReason {
    Entry,
    Exit(ExitReason),
}

/// A simulated execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    /// Bar the fill happened on
    pub bar_index: usize,
    /// Timestamp of that bar (Unix milliseconds)
    pub timestamp: i64,
    /// Buy or sell
    pub side: Side,
    /// Direction of the position this fill opens or closes
    pub position_side: PositionSide,
    /// Units filled, always positive
    pub quantity: Decimal,
    /// Price before slippage
    pub reference_price: Decimal,
    /// Price actually paid or received
    pub price: Decimal,
    /// Cost of slippage for the whole quantity
    pub slippage: Decimal,
    /// Commission charged
    pub commission: Decimal,
    /// Entry or exit
    pub reason: FillReason,
}

impl Fill {
    /// Notional value at the fill price.
    pub fn notional(&self) -> Decimal {
        self.quantity * self.price
    }
}

/// A closed round trip. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    /// Sequential id within the run
    pub id: u64,
    pub side: PositionSide,
    pub quantity: Decimal,
    pub entry_index: usize,
    pub entry_timestamp: i64,
    pub entry_price: Decimal,
    pub exit_index: usize,
    pub exit_timestamp: i64,
    pub exit_price: Decimal,
    /// Price move times quantity, before costs
    pub gross_pnl: Decimal,
    /// Entry plus exit commission
    pub commission: Decimal,
    /// Entry plus exit slippage (already reflected in the prices)
    pub slippage: Decimal,
    /// Gross P&L minus commission
    pub net_pnl: Decimal,
    pub exit_reason: ExitReason,
}

impl Trade {
    pub fn bars_held(&self) -> usize {
        self.exit_index - self.entry_index
    }

    pub fn is_winner(&self) -> bool {
        self.net_pnl > Decimal::ZERO
    }

    pub fn is_loser(&self) -> bool {
        self.net_pnl < Decimal::ZERO
    }
}

/// One equity-curve entry, recorded once per bar after all fills.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub timestamp: i64,
    pub cash: Decimal,
    pub position_value: Decimal,
    pub equity: Decimal,
}
