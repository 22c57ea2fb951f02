//! OHLCV bar data structures

use crate::error::DataError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A validated OHLCV bar
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Open time in milliseconds since the Unix epoch
    pub timestamp: i64,
    /// Opening price
    pub open: f64,
    /// High price
    pub high: f64,
    /// Low price
    pub low: f64,
    /// Closing price (the live price while the bar is forming)
    pub close: f64,
    /// Volume
    pub volume: f64,
    /// Whether the bar is closed
    pub is_final: bool,
}

impl Bar {
    /// Create a new bar
    pub fn new(
        timestamp: i64,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
        is_final: bool,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
            is_final,
        }
    }

    /// Open time as a UTC datetime
    pub fn time(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp)
    }

    /// Read a single numeric field
    pub fn field(&self, field: BarField) -> f64 {
        match field {
            BarField::Open => self.open,
            BarField::High => self.high,
            BarField::Low => self.low,
            BarField::Close => self.close,
            BarField::Volume => self.volume,
        }
    }
}

/// Numeric columns of a bar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BarField {
    Open,
    High,
    Low,
    Close,
    Volume,
}

/// A bar as delivered by a collaborator, before validation.
///
/// Any missing or non-finite field makes the bar malformed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawBar {
    pub timestamp: Option<i64>,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<f64>,
    #[serde(default)]
    pub is_final: bool,
}

fn finite(value: Option<f64>, name: &'static str) -> Result<f64, DataError> {
    match value {
        Some(v) if v.is_finite() => Ok(v),
        _ => Err(DataError::Malformed(name)),
    }
}

impl TryFrom<RawBar> for Bar {
    type Error = DataError;

    fn try_from(raw: RawBar) -> Result<Self, Self::Error> {
        Ok(Self {
            timestamp: raw.timestamp.ok_or(DataError::Malformed("timestamp"))?,
            open: finite(raw.open, "open")?,
            high: finite(raw.high, "high")?,
            low: finite(raw.low, "low")?,
            close: finite(raw.close, "close")?,
            volume: finite(raw.volume, "volume")?,
            is_final: raw.is_final,
        })
    }
}

impl From<Bar> for RawBar {
    fn from(bar: Bar) -> Self {
        Self {
            timestamp: Some(bar.timestamp),
            open: Some(bar.open),
            high: Some(bar.high),
            low: Some(bar.low),
            close: Some(bar.close),
            volume: Some(bar.volume),
            is_final: bar.is_final,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_bar_validation() {
        let bar = Bar::new(1_700_000_000_000, 1.0, 2.0, 0.5, 1.5, 10.0, true);
        let raw = RawBar::from(bar);
        assert_eq!(Bar::try_from(raw.clone()), Ok(bar));

        let missing_close = RawBar { close: None, ..raw.clone() };
        assert_eq!(
            Bar::try_from(missing_close),
            Err(DataError::Malformed("close"))
        );

        let nan_volume = RawBar { volume: Some(f64::NAN), ..raw };
        assert_eq!(Bar::try_from(nan_volume), Err(DataError::Malformed("volume")));
    }

    #[test]
    fn test_bar_time() {
        let bar = Bar::new(0, 1.0, 1.0, 1.0, 1.0, 0.0, false);
        assert_eq!(bar.time(), DateTime::from_timestamp(0, 0));
        assert_eq!(bar.field(BarField::Close), 1.0);
    }
}
