//! Bar interval definitions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DataError;

/// Trading hours in a regular US equity session.
const SESSION_HOURS: f64 = 6.5;
/// Trading days per year used for annualisation.
const TRADING_DAYS: f64 = 252.0;

/// Interval covered by one bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Timeframe {
    #[serde(rename = "1m")]
    Minute1,
    #[serde(rename = "5m")]
    Minute5,
    #[serde(rename = "15m")]
    Minute15,
    #[serde(rename = "30m")]
    Minute30,
    #[serde(rename = "1h")]
    Hour1,
    #[serde(rename = "1d")]
    #[default]
    Daily,
    #[serde(rename = "1w")]
    Weekly,
    #[serde(rename = "1mo")]
    Monthly,
}

impl Timeframe {
    /// Number of bars in one year, the annualisation factor for returns.
    pub fn periods_per_year(&self) -> f64 {
        let intraday = |minutes: f64| TRADING_DAYS * SESSION_HOURS * 60.0 / minutes;
        match self {
            Timeframe::Minute1 => intraday(1.0),
            Timeframe::Minute5 => intraday(5.0),
            Timeframe::Minute15 => intraday(15.0),
            Timeframe::Minute30 => intraday(30.0),
            Timeframe::Hour1 => intraday(60.0),
            Timeframe::Daily => TRADING_DAYS,
            Timeframe::Weekly => 52.0,
            Timeframe::Monthly => 12.0,
        }
    }

    /// Nominal length of one bar in milliseconds. Months count as 31 days.
    pub fn duration_ms(&self) -> i64 {
        const MINUTE: i64 = 60_000;
        const DAY: i64 = 24 * 60 * MINUTE;
        match self {
            Timeframe::Minute1 => MINUTE,
            Timeframe::Minute5 => 5 * MINUTE,
            Timeframe::Minute15 => 15 * MINUTE,
            Timeframe::Minute30 => 30 * MINUTE,
            Timeframe::Hour1 => 60 * MINUTE,
            Timeframe::Daily => DAY,
            Timeframe::Weekly => 7 * DAY,
            Timeframe::Monthly => 31 * DAY,
        }
    }

    /// Check if this is an intraday timeframe.
    pub fn is_intraday(&self) -> bool {
        matches!(
            self,
            Timeframe::Minute1
                | Timeframe::Minute5
                | Timeframe::Minute15
                | Timeframe::Minute30
                | Timeframe::Hour1
        )
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Timeframe::Minute1 => "1m",
            Timeframe::Minute5 => "5m",
            Timeframe::Minute15 => "15m",
            Timeframe::Minute30 => "30m",
            Timeframe::Hour1 => "1h",
            Timeframe::Daily => "1d",
            Timeframe::Weekly => "1w",
            Timeframe::Monthly => "1mo",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for Timeframe {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "1m" | "1min" | "minute" => Ok(Timeframe::Minute1),
            "5m" | "5min" => Ok(Timeframe::Minute5),
            "15m" | "15min" => Ok(Timeframe::Minute15),
            "30m" | "30min" => Ok(Timeframe::Minute30),
            "1h" | "60m" | "hour" => Ok(Timeframe::Hour1),
            "1d" | "day" | "daily" => Ok(Timeframe::Daily),
            "1w" | "1wk" | "week" | "weekly" => Ok(Timeframe::Weekly),
            "1mo" | "month" | "monthly" => Ok(Timeframe::Monthly),
            _ => Err(DataError::InvalidTimeframe(s.to_string())),
        }
    }
}
