//! Position types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Order side (buy or sell).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Get the opposite side.
    pub fn opposite(&self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// Direction of exposure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PositionSide {
    #[default]
    Flat,
    Long,
    Short,
}

impl PositionSide {
    /// Side of the fill that opens exposure in this direction.
    pub fn entry_side(&self) -> Option<Side> {
        match self {
            PositionSide::Long => Some(Side::Buy),
            PositionSide::Short => Some(Side::Sell),
            PositionSide::Flat => None,
        }
    }

    /// Side of the fill that closes exposure in this direction.
    pub fn exit_side(&self) -> Option<Side> {
        self.entry_side().map(|s| s.opposite())
    }

    /// +1 for long, -1 for short, 0 when flat.
    pub fn sign(&self) -> Decimal {
        match self {
            PositionSide::Long => Decimal::ONE,
            PositionSide::Short => -Decimal::ONE,
            PositionSide::Flat => Decimal::ZERO,
        }
    }
}

impl fmt::Display for PositionSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionSide::Flat => write!(f, "FLAT"),
            PositionSide::Long => write!(f, "LONG"),
            PositionSide::Short => write!(f, "SHORT"),
        }
    }
}

/// The single open position of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Long or short
    pub side: PositionSide,
    /// Number of units, always positive
    pub quantity: Decimal,
    /// Fill price of the entry
    pub entry_price: Decimal,
    /// Bar index of the entry fill
    pub entry_index: usize,
    /// Timestamp of the entry fill (Unix milliseconds)
    pub entry_timestamp: i64,
    /// Commission paid on entry
    pub entry_commission: Decimal,
    /// Slippage paid on entry
    pub entry_slippage: Decimal,
}

impl Position {
    /// Signed quantity: positive for long, negative for short.
    pub fn signed_quantity(&self) -> Decimal {
        self.quantity * self.side.sign()
    }

    /// Value of the position at `price`, signed by direction.
    pub fn market_value(&self, price: Decimal) -> Decimal {
        self.signed_quantity() * price
    }

    /// Unrealized profit/loss at `price`, before exit costs.
    pub fn unrealized_pnl(&self, price: Decimal) -> Decimal {
        (price - self.entry_price) * self.signed_quantity()
    }
}
