//! Cash, position and equity-curve bookkeeping.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use trading_core::types::{EquityPoint, ExitReason, Fill, FillReason, Position, PositionSide, Side, Trade};

/// Owns the cash balance and the single open position of a run.
///
/// The only mutators are [`Ledger::apply_fill`] and [`Ledger::record_equity`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ledger {
    initial_cash: Decimal,
    cash: Decimal,
    position: Option<Position>,
    equity_curve: Vec<EquityPoint>,
    trades: Vec<Trade>,
    next_trade_id: u64,
}

impl Ledger {
    pub fn new(initial_cash: Decimal) -> Self {
        Self {
            initial_cash,
            cash: initial_cash,
            position: None,
            equity_curve: Vec::new(),
            trades: Vec::new(),
            next_trade_id: 1,
        }
    }

    /// Pre-size the equity curve for a run of `bars` bars.
    pub fn with_capacity(initial_cash: Decimal, bars: usize) -> Self {
        let mut ledger = Self::new(initial_cash);
        ledger.equity_curve.reserve(bars);
        ledger
    }

    pub fn initial_cash(&self) -> Decimal {
        self.initial_cash
    }

    pub fn cash(&self) -> Decimal {
        self.cash
    }

    pub fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }

    pub fn position_side(&self) -> PositionSide {
        self.position.as_ref().map_or(PositionSide::Flat, |p| p.side)
    }

    /// Value of the open position at `price`.
    pub fn position_value(&self, price: Decimal) -> Decimal {
        self.position
            .as_ref()
            .map_or(Decimal::ZERO, |p| p.market_value(price))
    }

    /// Equity at `price`: cash plus the signed value of the open position.
    pub fn mark_to_market(&self, price: Decimal) -> Decimal {
        self.cash + self.position_value(price)
    }

    /// Book a fill. Returns the completed trade when the fill closes a position.
    ///
    /// An exit fill with no open position is ignored.
    pub fn apply_fill(&mut self, fill: &Fill) -> Option<Trade> {
        if matches!(fill.reason, FillReason::Exit(_)) && self.position.is_none() {
            return None;
        }

        let notional = fill.notional();
        match fill.side {
            Side::Buy => self.cash -= notional + fill.commission,
            Side::Sell => self.cash += notional - fill.commission,
        }

        match fill.reason {
            FillReason::Entry => {
                debug_assert!(self.position.is_none(), "entry fill while a position is open");
                self.position = Some(Position {
                    side: fill.position_side,
                    quantity: fill.quantity,
                    entry_price: fill.price,
                    entry_index: fill.bar_index,
                    entry_timestamp: fill.timestamp,
                    entry_commission: fill.commission,
                    entry_slippage: fill.slippage,
                });
                None
            }
            FillReason::Exit(reason) => {
                let position = self.position.take()?;
                let trade = self.close_trade(position, fill, reason);
                self.trades.push(trade.clone());
                Some(trade)
            }
        }
    }

    fn close_trade(&mut self, position: Position, fill: &Fill, reason: ExitReason) -> Trade {
        let gross_pnl = (fill.price - position.entry_price) * position.signed_quantity();
        let commission = position.entry_commission + fill.commission;
        let id = self.next_trade_id;
        self.next_trade_id += 1;

        Trade {
            id,
            side: position.side,
            quantity: position.quantity,
            entry_index: position.entry_index,
            entry_timestamp: position.entry_timestamp,
            entry_price: position.entry_price,
            exit_index: fill.bar_index,
            exit_timestamp: fill.timestamp,
            exit_price: fill.price,
            gross_pnl,
            commission,
            slippage: position.entry_slippage + fill.slippage,
            net_pnl: gross_pnl - commission,
            exit_reason: reason,
        }
    }

    /// Append the bar's equity point, marked at `price`.
    pub fn record_equity(&mut self, timestamp: i64, price: Decimal) -> EquityPoint {
        let position_value = self.position_value(price);
        let point = EquityPoint {
            timestamp,
            cash: self.cash,
            position_value,
            equity: self.cash + position_value,
        };
        self.equity_curve.push(point);
        point
    }

    pub fn equity_curve(&self) -> &[EquityPoint] {
        &self.equity_curve
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    /// Hand over the recorded curve and trade log.
    pub fn into_parts(self) -> (Vec<EquityPoint>, Vec<Trade>) {
        (self.equity_curve, self.trades)
    }
}
