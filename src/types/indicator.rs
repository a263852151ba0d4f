use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Technical indicators for one symbol as of one bar.
///
/// Every numeric field is optional: a field is absent when the supplied
/// history is too short to compute it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct IndicatorVector {
    pub symbol: String,
    /// Date of the bar the vector was computed from.
    pub timestamp: NaiveDate,
    pub ma5: Option<f64>,
    pub ma10: Option<f64>,
    pub ma20: Option<f64>,
    pub ma50: Option<f64>,
    pub ma200: Option<f64>,
    #[serde(rename = "rsi")]
    pub rsi14: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub macd_hist: Option<f64>,
    pub bb_upper: Option<f64>,
    #[serde(rename = "bb_middle")]
    pub bb_mid: Option<f64>,
    pub bb_lower: Option<f64>,
    #[serde(rename = "volume_avg")]
    pub volume_avg20: Option<f64>,
}

impl IndicatorVector {
    /// Create an empty vector keyed by symbol and date.
    pub fn new(symbol: impl Into<String>, timestamp: NaiveDate) -> Self {
        Self {
            symbol: symbol.into(),
            timestamp,
            ..Default::default()
        }
    }

    /// Bollinger bands as `(upper, middle, lower)` when all three are present.
    pub fn bands(&self) -> Option<(f64, f64, f64)> {
        Some((self.bb_upper?, self.bb_mid?, self.bb_lower?))
    }

    /// RSI usable for scoring. A flat window reads exactly 0 and carries no
    /// oversold information, so it counts as absent.
    pub fn scored_rsi(&self) -> Option<f64> {
        self.rsi14.filter(|rsi| *rsi != 0.0)
    }
}
