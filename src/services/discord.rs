//! Discord webhook notifier.
//!
//! Sends one integrated signal message per symbol per run and one message
//! per indicator alert. A disabled or unconfigured notifier sends nothing.

use crate::error::{AppError, Result};
use crate::types::{Alert, AlertKind, PriceBar, RiskLevel, Signal, SignalAction};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info, warn};

const COLOR_BUY: u32 = 0x00ff00;
const COLOR_SELL: u32 = 0xff0000;
const COLOR_HOLD: u32 = 0xffff00;
const COLOR_ALERT: u32 = 0xffa500;

/// Discord notifier settings.
#[derive(Debug, Clone, Default)]
pub struct DiscordConfig {
    pub webhook_url: Option<String>,
    pub enabled: bool,
}

/// Posts embeds to a Discord webhook.
pub struct DiscordNotifier {
    config: DiscordConfig,
    client: Client,
}

impl DiscordNotifier {
    pub fn new(config: DiscordConfig) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(Self { config, client })
    }

    /// Whether messages will actually be sent.
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
            && self
                .config
                .webhook_url
                .as_deref()
                .is_some_and(|url| !url.is_empty())
    }

    /// Send the integrated signal message for a symbol.
    ///
    /// Returns whether a message was delivered.
    pub async fn notify_signal(
        &self,
        signal: &Signal,
        latest: &PriceBar,
        previous: Option<&PriceBar>,
    ) -> Result<bool> {
        let content = format!(
            "**{}** {} {} | ${:.2}",
            signal.symbol,
            action_emoji(signal.action),
            signal.action,
            latest.close
        );
        self.send(&content, signal_embed(signal, latest, previous)).await
    }

    /// Send one message for an indicator alert.
    pub async fn notify_alert(&self, alert: &Alert) -> Result<bool> {
        let content = format!(
            "**{}** {} alert: {}",
            alert.symbol,
            alert.label(),
            alert.message()
        );
        self.send(&content, alert_embed(alert)).await
    }

    async fn send(&self, content: &str, embed: Value) -> Result<bool> {
        if !self.config.enabled {
            debug!("Discord notifications disabled, skipping");
            return Ok(false);
        }
        let Some(url) = self.config.webhook_url.as_deref().filter(|u| !u.is_empty()) else {
            warn!("Discord webhook URL not configured, skipping");
            return Ok(false);
        };

        let payload = json!({
            "content": content,
            "embeds": [embed],
        });

        let response = self.client.post(url).json(&payload).send().await?;
        let status = response.status();

        if status == StatusCode::NO_CONTENT || status == StatusCode::OK {
            info!("Discord notification sent");
            Ok(true)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(AppError::ExternalApi(format!(
                "Discord webhook returned {}: {}",
                status, body
            )))
        }
    }
}

fn action_emoji(action: SignalAction) -> &'static str {
    match action {
        SignalAction::Buy => "🟢",
        SignalAction::Sell => "🔴",
        SignalAction::Hold => "🟡",
    }
}

fn action_color(action: SignalAction) -> u32 {
    match action {
        SignalAction::Buy => COLOR_BUY,
        SignalAction::Sell => COLOR_SELL,
        SignalAction::Hold => COLOR_HOLD,
    }
}

fn risk_emoji(risk: RiskLevel) -> &'static str {
    match risk {
        RiskLevel::Low => "🟢",
        RiskLevel::Medium => "🟡",
        RiskLevel::High => "🔴",
    }
}

/// Embed for a scored signal with the day's price context.
pub fn signal_embed(signal: &Signal, latest: &PriceBar, previous: Option<&PriceBar>) -> Value {
    let mut fields = vec![json!({
        "name": "💰 Price",
        "value": format!("**${:.2}**", latest.close),
        "inline": true
    })];

    if let Some(prev) = previous {
        if let Some(change) = latest.change_pct_from(prev.close) {
            let arrow = if change > 0.0 {
                "📈"
            } else if change < 0.0 {
                "📉"
            } else {
                "➡️"
            };
            fields.push(json!({
                "name": format!("{} Change", arrow),
                "value": format!("**{:+.2}%**", change),
                "inline": true
            }));
            fields.push(json!({
                "name": "Previous close",
                "value": format!("${:.2}", prev.close),
                "inline": true
            }));
        }
    }

    fields.extend([
        json!({
            "name": "Signal",
            "value": format!("{} **{}**", action_emoji(signal.action), signal.action),
            "inline": true
        }),
        json!({
            "name": "Confidence",
            "value": format!("{:.1}%", signal.confidence * 100.0),
            "inline": true
        }),
        json!({
            "name": "Risk",
            "value": format!("{} {}", risk_emoji(signal.risk_level), signal.risk_level),
            "inline": true
        }),
    ]);

    if !signal.reasoning.is_empty() {
        fields.push(json!({
            "name": "Reasoning",
            "value": signal.reasoning,
            "inline": false
        }));
    }

    json!({
        "title": format!("{} {} {}", action_emoji(signal.action), signal.symbol, signal.action),
        "color": action_color(signal.action),
        "fields": fields,
        "footer": { "text": format!("Session {}", signal.timestamp) }
    })
}

/// Embed for a single alert.
pub fn alert_embed(alert: &Alert) -> Value {
    let value = match &alert.kind {
        AlertKind::PriceMove { change_pct, .. } => format!("{:+.2}%", change_pct),
        AlertKind::VolumeSpike { ratio } => format!("{:.1}x", ratio),
        AlertKind::RsiOversold { rsi } | AlertKind::RsiOverbought { rsi } => format!("{:.2}", rsi),
        AlertKind::UpperBandBreak { close, .. } | AlertKind::LowerBandBreak { close, .. } => {
            format!("{:.2}", close)
        }
        AlertKind::ActionableSignal { confidence, .. } => {
            format!("{:.1}%", confidence * 100.0)
        }
    };

    json!({
        "title": format!("📊 {} {} alert", alert.symbol, alert.label()),
        "description": alert.message(),
        "color": COLOR_ALERT,
        "fields": [
            { "name": "Value", "value": value, "inline": true }
        ]
    })
}
