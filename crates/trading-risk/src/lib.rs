//! Risk management for backtests.
//!
//! Provides stop-loss levels, a drawdown guard with hysteresis, position
//! sizing, and the [`RiskController`] that applies them to strategy signals
//! as an ordered rule list.

mod drawdown;
mod position_sizer;
mod risk_controller;
mod stop_loss;

pub use drawdown::{DrawdownGuard, DrawdownTransition};
pub use position_sizer::{PositionSizer, PositionSizingMethod};
pub use risk_controller::{
    Action, AtrWarmupRule, DrawdownRule, RiskConfig, RiskContext, RiskController, RiskRule,
    RiskState, StopLossRule,
};
pub use stop_loss::{StopLossManager, StopLossMethod};
