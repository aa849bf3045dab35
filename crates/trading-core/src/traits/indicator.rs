//! Indicator trait definitions.

use crate::error::IndicatorError;

/// Trait for technical indicators.
///
/// Indicators are pure functions of their input. The output always has the
/// same length as the input; entries before the indicator is defined are
/// `None`.
pub trait Indicator: Send + Sync {
    /// The output type of the indicator.
    type Output;

    /// Calculate indicator values for the given data.
    fn calculate(&self, data: &[f64]) -> Vec<Option<Self::Output>>;

    /// Index of the first defined output.
    fn warmup(&self) -> usize;

    /// Get the name of the indicator.
    fn name(&self) -> &str;
}

/// Multi-output indicator (e.g., Bollinger Bands, MACD).
pub trait MultiOutputIndicator: Send + Sync {
    /// The output type containing multiple values.
    type Outputs;

    /// Calculate indicator values for the given data.
    fn calculate(&self, data: &[f64]) -> Vec<Option<Self::Outputs>>;

    /// Index of the first defined output.
    fn warmup(&self) -> usize;

    /// Get the name of the indicator.
    fn name(&self) -> &str;
}

/// Indicator that needs the high/low/close columns, not only closes.
pub trait OhlcvIndicator: Send + Sync {
    /// The output type of the indicator.
    type Output;

    /// Calculate indicator values. All slices must have the same length.
    fn calculate(&self, high: &[f64], low: &[f64], close: &[f64]) -> Vec<Option<Self::Output>>;

    /// Index of the first defined output.
    fn warmup(&self) -> usize;

    /// Get the name of the indicator.
    fn name(&self) -> &str;
}

/// Reject zero-length windows before any calculation.
pub fn validate_period(name: &str, period: usize) -> Result<(), IndicatorError> {
    if period == 0 {
        return Err(IndicatorError::InvalidParameter(format!(
            "{} period must be greater than zero",
            name
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestIndicator {
        period: usize,
    }

    impl Indicator for TestIndicator {
        type Output = f64;

        fn calculate(&self, data: &[f64]) -> Vec<Option<f64>> {
            // Rolling sum for testing
            (0..data.len())
                .map(|i| {
                    (i + 1 >= self.period).then(|| data[i + 1 - self.period..=i].iter().sum())
                })
                .collect()
        }

        fn warmup(&self) -> usize {
            self.period - 1
        }

        fn name(&self) -> &str {
            "test"
        }
    }

    #[test]
    fn test_indicator_output_is_aligned() {
        let indicator = TestIndicator { period: 3 };
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let result = indicator.calculate(&data);

        assert_eq!(result.len(), data.len());
        assert_eq!(result[..indicator.warmup()], [None, None]);
        assert_eq!(result[2], Some(6.0)); // 1+2+3
        assert_eq!(result[4], Some(12.0)); // 3+4+5
    }

    #[test]
    fn test_validate_period() {
        assert!(validate_period("sma", 0).is_err());
        assert!(validate_period("sma", 5).is_ok());
    }
}
