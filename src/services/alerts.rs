//! Alert rules evaluated after a symbol has been scored.

use crate::types::{Alert, AlertKind, IndicatorVector, PriceBar, Signal};
use serde::Serialize;

/// Thresholds for [`AlertEngine`].
#[derive(Debug, Clone, PartialEq)]
pub struct AlertConfig {
    /// Absolute day-over-day move in percent.
    pub price_change_threshold: f64,
    /// Multiple of the average volume.
    pub volume_spike_threshold: f64,
    /// Bars averaged for the volume check, latest included.
    pub volume_window: usize,
    /// Minimum bars in the window before the volume check runs.
    pub volume_min_bars: usize,
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            price_change_threshold: 2.0,
            volume_spike_threshold: 2.0,
            volume_window: 20,
            volume_min_bars: 6,
            rsi_oversold: 30.0,
            rsi_overbought: 70.0,
        }
    }
}

/// Evaluates alert conditions over a symbol's latest data.
#[derive(Debug, Clone, Default)]
pub struct AlertEngine {
    config: AlertConfig,
}

impl AlertEngine {
    pub fn new(config: AlertConfig) -> Self {
        Self { config }
    }

    /// Alerts for the last bar of `bars` (ascending).
    ///
    /// Order: price move, volume spike, RSI, Bollinger break, actionable signal.
    pub fn evaluate(
        &self,
        bars: &[PriceBar],
        indicators: Option<&IndicatorVector>,
        signal: Option<&Signal>,
    ) -> Vec<Alert> {
        let Some(latest) = bars.last() else {
            return Vec::new();
        };
        let symbol = latest.symbol.as_str();
        let mut alerts = Vec::new();

        if let Some(kind) = self.price_move(bars) {
            alerts.push(Alert::new(symbol, kind));
        }
        if let Some(kind) = self.volume_spike(bars) {
            alerts.push(Alert::new(symbol, kind));
        }
        if let Some(ind) = indicators {
            alerts.extend(
                self.indicator_alerts(latest.close, ind)
                    .into_iter()
                    .map(|kind| Alert::new(symbol, kind)),
            );
        }
        if let Some(signal) = signal.filter(|s| s.action.is_actionable()) {
            alerts.push(Alert::new(
                symbol,
                AlertKind::ActionableSignal {
                    action: signal.action,
                    confidence: signal.confidence,
                },
            ));
        }

        alerts
    }

    /// Day-over-day close move of the last two bars.
    pub fn price_move(&self, bars: &[PriceBar]) -> Option<AlertKind> {
        let [.., previous, latest] = bars else {
            return None;
        };
        let change_pct = latest.change_pct_from(previous.close)?;

        (change_pct.abs() >= self.config.price_change_threshold).then_some(AlertKind::PriceMove {
            change_pct,
            previous_close: previous.close,
        })
    }

    /// Latest volume against the average of the trailing window.
    pub fn volume_spike(&self, bars: &[PriceBar]) -> Option<AlertKind> {
        let latest = bars.last()?;
        if latest.volume <= 0 {
            return None;
        }

        let window = &bars[bars.len().saturating_sub(self.config.volume_window)..];
        if window.len() < self.config.volume_min_bars {
            return None;
        }

        let average = window.iter().map(|b| b.volume as f64).sum::<f64>() / window.len() as f64;
        let ratio = latest.volume as f64 / average;

        (ratio >= self.config.volume_spike_threshold).then_some(AlertKind::VolumeSpike { ratio })
    }

    /// RSI zone and Bollinger band breaks for a close.
    pub fn indicator_alerts(&self, close: f64, ind: &IndicatorVector) -> Vec<AlertKind> {
        let mut kinds = Vec::new();

        if let Some(rsi) = ind.rsi14 {
            if rsi < self.config.rsi_oversold {
                kinds.push(AlertKind::RsiOversold { rsi });
            } else if rsi > self.config.rsi_overbought {
                kinds.push(AlertKind::RsiOverbought { rsi });
            }
        }

        if let (Some(upper), Some(lower)) = (ind.bb_upper, ind.bb_lower) {
            if close >= upper {
                kinds.push(AlertKind::UpperBandBreak { close, band: upper });
            } else if close <= lower {
                kinds.push(AlertKind::LowerBandBreak { close, band: lower });
            }
        }

        kinds
    }
}

/// Alert messages for one symbol, grouped by source.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AlertReport {
    pub symbol: String,
    /// Price moves and volume spikes.
    pub price_alerts: Vec<String>,
    /// RSI zones and Bollinger band breaks.
    pub indicator_alerts: Vec<String>,
    pub signal_alerts: Vec<String>,
}

impl AlertReport {
    pub fn from_alerts(symbol: &str, alerts: &[Alert]) -> Self {
        let mut report = Self {
            symbol: symbol.to_uppercase(),
            ..Default::default()
        };

        for alert in alerts {
            let bucket = match alert.kind {
                AlertKind::PriceMove { .. } | AlertKind::VolumeSpike { .. } => {
                    &mut report.price_alerts
                }
                AlertKind::ActionableSignal { .. } => &mut report.signal_alerts,
                _ => &mut report.indicator_alerts,
            };
            bucket.push(alert.message());
        }

        report
    }

    pub fn total(&self) -> usize {
        self.price_alerts.len() + self.indicator_alerts.len() + self.signal_alerts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RiskLevel, SignalAction};
    use chrono::NaiveDate;

    fn bars(closes: &[f64], volumes: &[i64]) -> Vec<PriceBar> {
        let start = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        closes
            .iter()
            .zip(volumes)
            .enumerate()
            .map(|(i, (c, v))| {
                PriceBar::new("NVDA", start + chrono::Duration::days(i as i64), *c, *c, *c, *c, *v)
            })
            .collect()
    }

    #[test]
    fn test_price_move_threshold() {
        let engine = AlertEngine::default();
        assert!(engine.price_move(&bars(&[100.0, 101.9], &[1, 1])).is_none());

        match engine.price_move(&bars(&[100.0, 97.5], &[1, 1])) {
            Some(AlertKind::PriceMove { change_pct, previous_close }) => {
                assert!((change_pct + 2.5).abs() < 1e-9);
                assert_eq!(previous_close, 100.0);
            }
            other => panic!("unexpected {:?}", other),
        }

        assert!(engine.price_move(&bars(&[100.0], &[1])).is_none());
    }

    #[test]
    fn test_volume_spike_needs_history() {
        let engine = AlertEngine::default();
        let closes = [1.0; 6];

        assert!(engine
            .volume_spike(&bars(&closes[..5], &[100, 100, 100, 100, 1000]))
            .is_none());

        // Average includes the spike: (5 * 100 + 1000) / 6 = 250, ratio 4.0.
        match engine.volume_spike(&bars(&closes, &[100, 100, 100, 100, 100, 1000])) {
            Some(AlertKind::VolumeSpike { ratio }) => assert!((ratio - 4.0).abs() < 1e-9),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_indicator_alerts() {
        let engine = AlertEngine::default();
        let mut ind = IndicatorVector::new("NVDA", NaiveDate::from_ymd_opt(2026, 1, 5).unwrap());
        ind.rsi14 = Some(75.0);
        ind.bb_upper = Some(110.0);
        ind.bb_lower = Some(90.0);

        let kinds = engine.indicator_alerts(112.0, &ind);
        assert_eq!(
            kinds,
            vec![
                AlertKind::RsiOverbought { rsi: 75.0 },
                AlertKind::UpperBandBreak { close: 112.0, band: 110.0 },
            ]
        );

        ind.rsi14 = Some(50.0);
        assert!(engine.indicator_alerts(100.0, &ind).is_empty());
    }

    #[test]
    fn test_evaluate_hold_signal_not_alerted() {
        let engine = AlertEngine::default();
        let history = bars(&[100.0, 100.5], &[10, 10]);
        let mut signal = Signal {
            symbol: "NVDA".into(),
            timestamp: history[1].timestamp,
            action: SignalAction::Hold,
            confidence: 0.5,
            risk_level: RiskLevel::Low,
            reasons: Vec::new(),
            reasoning: String::new(),
            score: 0,
        };
        assert!(engine.evaluate(&history, None, Some(&signal)).is_empty());

        signal.action = SignalAction::Buy;
        let alerts = engine.evaluate(&history, None, Some(&signal));
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].label(), "Signal");
    }

    #[test]
    fn test_report_groups_by_source() {
        let alerts = vec![
            Alert::new("nvda", AlertKind::VolumeSpike { ratio: 3.0 }),
            Alert::new("nvda", AlertKind::RsiOversold { rsi: 22.0 }),
            Alert::new(
                "nvda",
                AlertKind::ActionableSignal {
                    action: SignalAction::Sell,
                    confidence: 0.7,
                },
            ),
            Alert::new("nvda", AlertKind::LowerBandBreak { close: 89.0, band: 90.0 }),
            Alert::new(
                "nvda",
                AlertKind::PriceMove {
                    change_pct: -3.1,
                    previous_close: 100.0,
                },
            ),
        ];

        let report = AlertReport::from_alerts("nvda", &alerts);
        assert_eq!(report.symbol, "NVDA");
        assert_eq!(
            report.price_alerts,
            vec!["Volume spike (3.0x average volume)", "Price moved -3.10%"]
        );
        assert_eq!(report.indicator_alerts.len(), 2);
        assert_eq!(report.signal_alerts, vec!["Signal: SELL (confidence 70.0%)"]);
        assert_eq!(report.total(), 5);

        assert_eq!(AlertReport::from_alerts("QQQ", &[]).total(), 0);
    }
}
