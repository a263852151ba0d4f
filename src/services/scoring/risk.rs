//! Risk classification for a scored signal.

use super::ScoringConfig;
use crate::types::{IndicatorVector, RiskLevel};

/// Thresholds feeding the risk-factor tally.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskThresholds {
    /// RSI below this (or above `rsi_extreme_high`) adds two factors.
    pub rsi_extreme_low: f64,
    pub rsi_extreme_high: f64,
    /// Relative distance from MA200 that adds two factors.
    pub deviation_high: f64,
    /// Relative distance from MA200 that adds one factor.
    pub deviation_elevated: f64,
    /// `(upper - lower) / middle` above this adds one factor.
    pub band_width: f64,
    /// `|score|` above this adds one factor.
    pub strong_score: i32,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            rsi_extreme_low: 20.0,
            rsi_extreme_high: 80.0,
            deviation_high: 0.20,
            deviation_elevated: 0.10,
            band_width: 0.15,
            strong_score: 50,
        }
    }
}

/// Count risk factors for a close, its indicators and the signal score.
pub fn risk_factors(
    price: f64,
    indicators: &IndicatorVector,
    score: i32,
    config: &ScoringConfig,
) -> u32 {
    let t = &config.risk;
    let mut factors = 0;

    if let Some(rsi) = indicators.scored_rsi() {
        if rsi < t.rsi_extreme_low || rsi > t.rsi_extreme_high {
            factors += 2;
        } else if rsi < config.rsi_oversold || rsi > config.rsi_overbought {
            factors += 1;
        }
    }

    if let Some(ma200) = indicators.ma200.filter(|ma| *ma != 0.0) {
        let deviation = (price - ma200).abs() / ma200;
        if deviation > t.deviation_high {
            factors += 2;
        } else if deviation > t.deviation_elevated {
            factors += 1;
        }
    }

    if let Some((upper, middle, lower)) = indicators.bands() {
        if middle != 0.0 && (upper - lower) / middle > t.band_width {
            factors += 1;
        }
    }

    if score.abs() > t.strong_score {
        factors += 1;
    }

    factors
}

/// Bucket the risk-factor tally into a [`RiskLevel`].
pub fn assess_risk(
    price: f64,
    indicators: &IndicatorVector,
    score: i32,
    config: &ScoringConfig,
) -> RiskLevel {
    RiskLevel::from_factors(risk_factors(price, indicators, score, config))
}
