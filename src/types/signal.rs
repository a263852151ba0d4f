use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Discrete trading recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalAction {
    Buy,
    Sell,
    Hold,
}

impl SignalAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalAction::Buy => "BUY",
            SignalAction::Sell => "SELL",
            SignalAction::Hold => "HOLD",
        }
    }

    /// Parse the stored representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "BUY" => Some(SignalAction::Buy),
            "SELL" => Some(SignalAction::Sell),
            "HOLD" => Some(SignalAction::Hold),
            _ => None,
        }
    }

    /// Whether the signal asks for a position change.
    pub fn is_actionable(&self) -> bool {
        !matches!(self, SignalAction::Hold)
    }
}

impl fmt::Display for SignalAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Risk bucket attached to a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Bucket an integer risk-factor tally.
    pub fn from_factors(factors: u32) -> Self {
        match factors {
            f if f >= 3 => RiskLevel::High,
            f if f >= 1 => RiskLevel::Medium,
            _ => RiskLevel::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "LOW" => Some(RiskLevel::Low),
            "MEDIUM" => Some(RiskLevel::Medium),
            "HIGH" => Some(RiskLevel::High),
            _ => None,
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scored trading signal for one symbol on one trading day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub symbol: String,
    /// Copied from the scored bar, never from the wall clock.
    pub timestamp: NaiveDate,
    #[serde(rename = "signal")]
    pub action: SignalAction,
    /// Rounded to two decimals.
    pub confidence: f64,
    pub risk_level: RiskLevel,
    /// Triggered rule reasons in evaluation order (at most ten kept).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reasons: Vec<String>,
    /// Joined reasons, at most 500 characters.
    pub reasoning: String,
    /// Buy points minus sell points.
    pub score: i32,
}
