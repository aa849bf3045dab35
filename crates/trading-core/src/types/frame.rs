//! Named indicator series aligned to a bar series.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::IndicatorError;

/// Mapping from indicator name to a series with one entry per bar.
///
/// `None` marks a warm-up entry where the indicator is not yet defined.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorFrame {
    len: usize,
    series: BTreeMap<String, Vec<Option<f64>>>,
}

impl IndicatorFrame {
    /// Create an empty frame for a bar series of `len` bars.
    pub fn new(len: usize) -> Self {
        Self {
            len,
            series: BTreeMap::new(),
        }
    }

    /// Number of bars every series must cover.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Add a series. Rejects series that are not aligned to the bars.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        values: Vec<Option<f64>>,
    ) -> Result<(), IndicatorError> {
        let name = name.into();
        if values.len() != self.len {
            return Err(IndicatorError::LengthMismatch {
                name,
                expected: self.len,
                actual: values.len(),
            });
        }
        self.series.insert(name, values);
        Ok(())
    }

    /// Full series by name.
    pub fn get(&self, name: &str) -> Option<&[Option<f64>]> {
        self.series.get(name).map(|v| v.as_slice())
    }

    /// Value of `name` at bar `index`. `None` when unknown or still warming up.
    #[inline]
    pub fn value(&self, name: &str, index: usize) -> Option<f64> {
        self.series.get(name)?.get(index).copied().flatten()
    }

    /// Names of all series, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(|k| k.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_rejects_misaligned_series() {
        let mut frame = IndicatorFrame::new(3);
        assert!(frame.insert("sma", vec![None, Some(1.0), Some(2.0)]).is_ok());

        let err = frame.insert("ema", vec![Some(1.0)]).unwrap_err();
        assert!(matches!(
            err,
            IndicatorError::LengthMismatch {
                expected: 3,
                actual: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_frame_value_lookup() {
        let mut frame = IndicatorFrame::new(3);
        frame.insert("sma", vec![None, Some(1.0), Some(2.0)]).unwrap();

        assert_eq!(frame.value("sma", 0), None);
        assert_eq!(frame.value("sma", 2), Some(2.0));
        assert_eq!(frame.value("sma", 5), None);
        assert_eq!(frame.value("missing", 1), None);
        assert_eq!(frame.names().collect::<Vec<_>>(), vec!["sma"]);
    }
}
