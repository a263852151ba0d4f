use crate::services::alerts::AlertConfig;
use crate::services::discord::DiscordConfig;
use crate::services::scoring::ScoringConfig;
use std::env;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_SYMBOLS: &str = "QQQ,SMH,TSLA,NVDA";

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// SQLite database file.
    pub database_path: String,
    /// Symbols collected and analyzed by the daily job.
    pub symbols: Vec<String>,
    /// Bars read back for indicator computation.
    pub lookback_bars: usize,
    pub scheduler_enabled: bool,
    pub schedule_hour_utc: u32,
    pub schedule_minute_utc: u32,
    /// Pause between per-symbol fetches.
    pub fetch_spacing: Duration,
    pub fetch_retries: u32,
    pub fetch_retry_delay: Duration,
    pub discord_webhook_url: Option<String>,
    pub discord_enabled: bool,
    /// Day-over-day move in percent that raises a price alert.
    pub price_change_threshold: f64,
    /// Multiple of average volume that raises a volume alert.
    pub volume_spike_threshold: f64,
    /// Score cutoff for BUY/SELL.
    pub signal_action_threshold: i32,
    /// Relative tolerance for Bollinger band proximity.
    pub bollinger_tolerance: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from a variable lookup, falling back to defaults
    /// for missing or unparsable values.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parsed(&lookup, "PORT", 8000),
            database_path: lookup("DATABASE_PATH")
                .unwrap_or_else(|| "data/stocks.db".to_string()),
            symbols: parse_symbols(
                &lookup("MONITORED_SYMBOLS").unwrap_or_else(|| DEFAULT_SYMBOLS.to_string()),
            ),
            lookback_bars: parsed(&lookup, "LOOKBACK_BARS", 260),
            scheduler_enabled: lookup("SCHEDULER_ENABLED")
                .map(|v| parse_bool(&v))
                .unwrap_or(true),
            schedule_hour_utc: parsed(&lookup, "SCHEDULE_HOUR_UTC", 22),
            schedule_minute_utc: parsed(&lookup, "SCHEDULE_MINUTE_UTC", 0),
            fetch_spacing: Duration::from_millis(parsed(&lookup, "FETCH_SPACING_MS", 3000)),
            fetch_retries: parsed(&lookup, "FETCH_RETRIES", 3),
            fetch_retry_delay: Duration::from_millis(parsed(
                &lookup,
                "FETCH_RETRY_DELAY_MS",
                2000,
            )),
            discord_webhook_url: lookup("DISCORD_WEBHOOK_URL")
                .filter(|url| !url.trim().is_empty()),
            discord_enabled: lookup("DISCORD_ENABLED")
                .map(|v| parse_bool(&v))
                .unwrap_or(false),
            price_change_threshold: parsed(&lookup, "PRICE_CHANGE_THRESHOLD", 2.0),
            volume_spike_threshold: parsed(&lookup, "VOLUME_SPIKE_THRESHOLD", 2.0),
            signal_action_threshold: parsed(&lookup, "SIGNAL_ACTION_THRESHOLD", 30),
            bollinger_tolerance: parsed(&lookup, "BOLLINGER_TOLERANCE", 0.02),
        }
    }

    pub fn scoring(&self) -> ScoringConfig {
        ScoringConfig {
            action_threshold: self.signal_action_threshold,
            band_tolerance: self.bollinger_tolerance,
            ..Default::default()
        }
    }

    pub fn alerts(&self) -> AlertConfig {
        AlertConfig {
            price_change_threshold: self.price_change_threshold,
            volume_spike_threshold: self.volume_spike_threshold,
            ..Default::default()
        }
    }

    pub fn discord(&self) -> DiscordConfig {
        DiscordConfig {
            webhook_url: self.discord_webhook_url.clone(),
            enabled: self.discord_enabled,
        }
    }
}

fn parsed<T, F>(lookup: &F, key: &str, default: T) -> T
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Split a comma list into trimmed, upper-cased symbols, dropping empties.
pub fn parse_symbols(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_bool(raw: &str) -> bool {
    matches!(raw.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
