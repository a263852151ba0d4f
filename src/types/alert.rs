use serde::{Deserialize, Serialize};

use super::SignalAction;

/// Condition that raised an alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AlertKind {
    PriceMove { change_pct: f64, previous_close: f64 },
    VolumeSpike { ratio: f64 },
    RsiOversold { rsi: f64 },
    RsiOverbought { rsi: f64 },
    UpperBandBreak { close: f64, band: f64 },
    LowerBandBreak { close: f64, band: f64 },
    ActionableSignal { action: SignalAction, confidence: f64 },
}

/// An alert raised for a symbol after the daily run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub symbol: String,
    pub kind: AlertKind,
}

impl Alert {
    pub fn new(symbol: impl Into<String>, kind: AlertKind) -> Self {
        Self {
            symbol: symbol.into(),
            kind,
        }
    }

    /// Short label of the indicator or condition behind the alert.
    pub fn label(&self) -> &'static str {
        match self.kind {
            AlertKind::PriceMove { .. } => "Price",
            AlertKind::VolumeSpike { .. } => "Volume",
            AlertKind::RsiOversold { .. } | AlertKind::RsiOverbought { .. } => "RSI",
            AlertKind::UpperBandBreak { .. } | AlertKind::LowerBandBreak { .. } => {
                "Bollinger Bands"
            }
            AlertKind::ActionableSignal { .. } => "Signal",
        }
    }

    /// Whether the alert concerns an indicator reading.
    pub fn is_indicator_alert(&self) -> bool {
        matches!(
            self.kind,
            AlertKind::RsiOversold { .. }
                | AlertKind::RsiOverbought { .. }
                | AlertKind::UpperBandBreak { .. }
                | AlertKind::LowerBandBreak { .. }
        )
    }

    /// One-line human readable message.
    pub fn message(&self) -> String {
        match &self.kind {
            AlertKind::PriceMove { change_pct, .. } => format!("Price moved {:+.2}%", change_pct),
            AlertKind::VolumeSpike { ratio } => {
                format!("Volume spike ({:.1}x average volume)", ratio)
            }
            AlertKind::RsiOversold { rsi } => format!("RSI oversold ({:.2} < 30)", rsi),
            AlertKind::RsiOverbought { rsi } => format!("RSI overbought ({:.2} > 70)", rsi),
            AlertKind::UpperBandBreak { close, band } => {
                format!("Price broke upper Bollinger band (${:.2} >= ${:.2})", close, band)
            }
            AlertKind::LowerBandBreak { close, band } => {
                format!("Price broke lower Bollinger band (${:.2} <= ${:.2})", close, band)
            }
            AlertKind::ActionableSignal { action, confidence } => {
                format!("Signal: {} (confidence {:.1}%)", action, confidence * 100.0)
            }
        }
    }
}
