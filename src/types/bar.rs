use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One trading day's OHLCV record for a symbol.
///
/// Bars are immutable once stored; the store keeps exactly one row per
/// `(symbol, timestamp)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceBar {
    pub symbol: String,
    /// Trading date of the bar.
    pub timestamp: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
    pub adjusted_close: f64,
}

impl PriceBar {
    /// Create a bar whose adjusted close equals its close.
    pub fn new(
        symbol: impl Into<String>,
        timestamp: NaiveDate,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: i64,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            timestamp,
            open,
            high,
            low,
            close,
            volume,
            adjusted_close: close,
        }
    }

    /// Percentage change of this bar's close against an earlier close.
    pub fn change_pct_from(&self, previous_close: f64) -> Option<f64> {
        if previous_close == 0.0 {
            return None;
        }
        Some((self.close - previous_close) / previous_close * 100.0)
    }
}
