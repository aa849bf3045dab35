//! Data source trait definitions.

use crate::error::DataError;
use crate::types::{Bar, Timeframe};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Trait for historical data sources.
///
/// The engine treats whatever a source returns as immutable, pre-fetched
/// input.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Fetch historical bars.
    ///
    /// # Arguments
    /// * `symbol` - The symbol to fetch
    /// * `timeframe` - The bar timeframe
    /// * `start` - Start of the date range
    /// * `end` - End of the date range
    ///
    /// # Returns
    /// A vector of bars ordered from oldest to newest
    async fn get_historical_bars(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Bar>, DataError>;

    /// Check if the source has data for a symbol.
    async fn is_valid_symbol(&self, symbol: &str) -> Result<bool, DataError>;

    /// Get the data source name.
    fn name(&self) -> &str;
}
