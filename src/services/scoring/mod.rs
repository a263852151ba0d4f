//! Rule-based signal scoring.
//!
//! Turns the latest close and its [`IndicatorVector`] into a BUY/SELL/HOLD
//! [`Signal`] with a confidence, a risk level and a reasoning trail. Scoring
//! is a pure function of its inputs and configuration.

pub mod risk;
pub mod rules;

pub use risk::{assess_risk, risk_factors, RiskThresholds};
pub use rules::{tally, Rule, RuleContext, RuleHit, Side, Tally, RULES};

use crate::error::ScoringError;
use crate::types::{IndicatorVector, PriceBar, Signal, SignalAction};
use tracing::debug;

/// Thresholds used by [`SignalScorer`].
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringConfig {
    /// `score >= threshold` is BUY, `score <= -threshold` is SELL.
    pub action_threshold: i32,
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
    /// Upper bound of the "leaning low" RSI zone.
    pub rsi_midline: f64,
    /// Relative tolerance for Bollinger band proximity.
    pub band_tolerance: f64,
    pub hold_confidence: f64,
    pub base_confidence: f64,
    /// `|score|` is divided by this before being added to `base_confidence`.
    pub confidence_scale: f64,
    pub max_confidence: f64,
    /// Reasons kept in the reasoning string.
    pub max_reasons: usize,
    /// Maximum reasoning length in characters.
    pub max_reasoning_chars: usize,
    pub risk: RiskThresholds,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            action_threshold: 30,
            rsi_oversold: 30.0,
            rsi_overbought: 70.0,
            rsi_midline: 50.0,
            band_tolerance: 0.02,
            hold_confidence: 0.5,
            base_confidence: 0.5,
            confidence_scale: 200.0,
            max_confidence: 0.95,
            max_reasons: 10,
            max_reasoning_chars: 500,
            risk: RiskThresholds::default(),
        }
    }
}

/// Scores a price/indicator pair into a [`Signal`].
#[derive(Debug, Clone, Default)]
pub struct SignalScorer {
    config: ScoringConfig,
}

impl SignalScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Score possibly-missing inputs, as read from storage.
    pub fn score_latest(
        &self,
        price: Option<&PriceBar>,
        indicators: Option<&IndicatorVector>,
    ) -> Result<Signal, ScoringError> {
        let price = price.ok_or(ScoringError::MissingInput("price"))?;
        let indicators = indicators.ok_or(ScoringError::MissingInput("indicators"))?;
        self.score(price, indicators)
    }

    /// Score the close of `price` against `indicators`.
    ///
    /// The emitted signal carries the bar's date.
    pub fn score(
        &self,
        price: &PriceBar,
        indicators: &IndicatorVector,
    ) -> Result<Signal, ScoringError> {
        if !price.symbol.eq_ignore_ascii_case(&indicators.symbol) {
            return Err(ScoringError::SymbolMismatch {
                price: price.symbol.clone(),
                indicators: indicators.symbol.clone(),
            });
        }

        if price.timestamp != indicators.timestamp {
            debug!(
                "Scoring {} close of {} against indicators as of {}",
                price.symbol, price.timestamp, indicators.timestamp
            );
        }

        let close = price.close;
        let result = tally(&RuleContext {
            price: close,
            indicators,
            config: &self.config,
        });
        let score = result.total();
        let action = self.decide(score);

        let reasons: Vec<String> = result
            .reasons
            .into_iter()
            .take(self.config.max_reasons)
            .collect();
        let reasoning = compose_reasoning(&reasons, &self.config);

        let signal = Signal {
            symbol: price.symbol.clone(),
            timestamp: price.timestamp,
            action,
            confidence: self.confidence(action, score),
            risk_level: assess_risk(close, indicators, score, &self.config),
            reasons,
            reasoning,
            score,
        };

        debug!(
            "Scored {}: buy={} sell={} total={} -> {} ({:.2}, {})",
            signal.symbol,
            result.buy,
            result.sell,
            score,
            signal.action,
            signal.confidence,
            signal.risk_level
        );

        Ok(signal)
    }

    /// Map a total score onto an action.
    pub fn decide(&self, score: i32) -> SignalAction {
        if score >= self.config.action_threshold {
            SignalAction::Buy
        } else if score <= -self.config.action_threshold {
            SignalAction::Sell
        } else {
            SignalAction::Hold
        }
    }

    /// Confidence for an action, rounded to two decimals.
    pub fn confidence(&self, action: SignalAction, score: i32) -> f64 {
        let cfg = &self.config;
        let raw = match action {
            SignalAction::Hold => cfg.hold_confidence,
            SignalAction::Buy | SignalAction::Sell => (cfg.base_confidence
                + f64::from(score.abs()) / cfg.confidence_scale)
                .min(cfg.max_confidence),
        };
        round_cents(raw)
    }
}

/// Round to two decimals from the exact binary value, so 0.725 (stored as
/// 0.72499...) becomes 0.72.
fn round_cents(value: f64) -> f64 {
    format!("{:.2}", value).parse().unwrap_or(value)
}

/// Join the first `max_reasons` reasons with `"; "` and cap the result at
/// `max_reasoning_chars` characters, ending in `"..."` when cut.
pub fn compose_reasoning(reasons: &[String], config: &ScoringConfig) -> String {
    let joined = reasons
        .iter()
        .take(config.max_reasons)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("; ");

    let limit = config.max_reasoning_chars;
    if joined.chars().count() <= limit {
        return joined;
    }

    let mut truncated: String = joined.chars().take(limit.saturating_sub(3)).collect();
    truncated.push_str("...");
    truncated
}
