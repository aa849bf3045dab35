//! Conversions between bar prices (`f64`) and accounting amounts (`Decimal`).

use num_traits::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

use crate::error::ExecutionError;

/// Convert a bar price into an exact accounting amount.
///
/// Non-finite or out-of-range values cannot be represented and are rejected.
pub fn to_decimal(value: f64) -> Result<Decimal, ExecutionError> {
    if !value.is_finite() {
        return Err(ExecutionError::InvalidPrice(value));
    }
    Decimal::from_f64(value).ok_or(ExecutionError::InvalidPrice(value))
}

/// Convert an accounting amount back to `f64` for statistics.
pub fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}
