//! The daily job: collect bars, compute indicators, score signals, then raise
//! alerts and notify. Plus the loop that triggers it on schedule.

use crate::error::{AppError, Result};
use crate::services::alerts::AlertEngine;
use crate::services::batch::BatchOrchestrator;
use crate::services::calendar::{is_trading_day, next_run_after, session_date};
use crate::services::discord::DiscordNotifier;
use crate::services::sqlite_store::SqliteStore;
use crate::sources::BarSource;
use crate::types::Alert;
use chrono::Utc;
use indexmap::IndexMap;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Stored bars below which a full year is fetched instead of the last week.
pub const FULL_HISTORY_BARS: usize = 200;

/// Bars read back for alert evaluation.
const ALERT_LOOKBACK_BARS: usize = 20;

/// Per-stage, per-symbol outcome of one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PipelineReport {
    pub collected: IndexMap<String, bool>,
    pub indicators: IndexMap<String, bool>,
    pub signals: IndexMap<String, bool>,
    pub notified: IndexMap<String, bool>,
}

impl PipelineReport {
    /// Symbols that made it through signal scoring.
    pub fn succeeded(&self) -> Vec<&str> {
        passed(&self.signals)
    }
}

fn passed(stage: &IndexMap<String, bool>) -> Vec<&str> {
    stage
        .iter()
        .filter(|(_, ok)| **ok)
        .map(|(symbol, _)| symbol.as_str())
        .collect()
}

fn owned(symbols: Vec<&str>) -> Vec<String> {
    symbols.into_iter().map(str::to_string).collect()
}

/// Runs the daily collect → indicators → signals → notify sequence.
pub struct DailyPipeline {
    store: Arc<SqliteStore>,
    source: Arc<dyn BarSource>,
    batch: BatchOrchestrator,
    alerts: AlertEngine,
    notifier: Arc<DiscordNotifier>,
    fetch_spacing: Duration,
    /// Serializes runs triggered by the scheduler and the API.
    running: Mutex<()>,
}

impl DailyPipeline {
    pub fn new(
        store: Arc<SqliteStore>,
        source: Arc<dyn BarSource>,
        batch: BatchOrchestrator,
        alerts: AlertEngine,
        notifier: Arc<DiscordNotifier>,
        fetch_spacing: Duration,
    ) -> Self {
        Self {
            store,
            source,
            batch,
            alerts,
            notifier,
            fetch_spacing,
            running: Mutex::new(()),
        }
    }

    pub fn batch(&self) -> &BatchOrchestrator {
        &self.batch
    }

    /// Fetch and store new bars for one symbol. Returns the number of bars written.
    pub async fn collect_symbol(&self, symbol: &str) -> Result<usize> {
        let stored = self.store.bar_count(symbol)?;
        let range = if stored < FULL_HISTORY_BARS { "1y" } else { "5d" };

        debug!(
            "Collecting {} from {} (range {}, {} bars stored)",
            symbol,
            self.source.name(),
            range,
            stored
        );

        let bars = self.source.fetch_daily(symbol, range).await?;
        if bars.is_empty() {
            return Err(AppError::ExternalApi(format!("No bars returned for {}", symbol)));
        }

        self.store.upsert_bars(&bars)
    }

    /// Collect every symbol in order, pausing between fetches.
    pub async fn collect(&self, symbols: &[String]) -> IndexMap<String, bool> {
        let mut results = IndexMap::with_capacity(symbols.len());

        for (i, symbol) in symbols.iter().enumerate() {
            if i > 0 && !self.fetch_spacing.is_zero() {
                tokio::time::sleep(self.fetch_spacing).await;
            }

            let ok = match self.collect_symbol(symbol).await {
                Ok(count) => {
                    info!("{}: stored {} bars", symbol, count);
                    true
                }
                Err(e) => {
                    warn!("{} collect failed: {}", symbol, e);
                    false
                }
            };
            results.insert(symbol.clone(), ok);
        }

        results
    }

    /// Alerts for a symbol from its stored bars, latest indicators and latest signal.
    pub fn check_alerts(&self, symbol: &str) -> Result<Vec<Alert>> {
        let bars = self.store.recent_bars(symbol, ALERT_LOOKBACK_BARS)?;
        if bars.is_empty() {
            return Err(AppError::NotFound(format!("No price data for {}", symbol)));
        }
        let indicators = self.store.latest_indicator(symbol)?;
        let signal = self.store.latest_signal(symbol)?;

        Ok(self
            .alerts
            .evaluate(&bars, indicators.as_ref(), signal.as_ref()))
    }

    /// Send one message per indicator alert.
    ///
    /// Returns `false` when the notifier is off or any delivery failed.
    pub async fn deliver_alerts(&self, symbol: &str, alerts: &[Alert]) -> bool {
        if !self.notifier.is_enabled() {
            return false;
        }

        let mut delivered = true;
        for alert in alerts.iter().filter(|a| a.is_indicator_alert()) {
            if let Err(e) = self.notifier.notify_alert(alert).await {
                error!("{} alert notification failed: {}", symbol, e);
                delivered = false;
            }
        }
        delivered
    }

    /// Evaluate alerts for a scored symbol and send its notifications.
    ///
    /// Delivery failures are logged and reported as `Ok(false)`.
    pub async fn notify_symbol(&self, symbol: &str) -> Result<bool> {
        let signal = self
            .store
            .latest_signal(symbol)?
            .ok_or_else(|| AppError::NotFound(format!("No signal for {}", symbol)))?;
        let alerts = self.check_alerts(symbol)?;
        for alert in &alerts {
            info!("{} alert: {}", symbol, alert.message());
        }

        if !self.notifier.is_enabled() {
            return Ok(false);
        }

        let bars = self.store.recent_bars(symbol, 2)?;
        let Some(latest) = bars.last() else {
            return Ok(false);
        };
        let previous = bars.len().checked_sub(2).and_then(|i| bars.get(i));

        let mut delivered = true;
        if let Err(e) = self.notifier.notify_signal(&signal, latest, previous).await {
            error!("{} signal notification failed: {}", symbol, e);
            delivered = false;
        }

        Ok(self.deliver_alerts(symbol, &alerts).await && delivered)
    }

    /// Run every stage. Each stage only sees the symbols that passed the previous one.
    pub async fn run(&self, symbols: &[String]) -> PipelineReport {
        let _guard = self.running.lock().await;
        info!("Daily pipeline starting for {} symbols", symbols.len());

        let collected = self.collect(symbols).await;
        let indicators = self.batch.run_indicators(&owned(passed(&collected)));
        let signals = self.batch.run_all(&owned(passed(&indicators)));

        let mut notified = IndexMap::new();
        for symbol in passed(&signals) {
            let ok = match self.notify_symbol(symbol).await {
                Ok(ok) => ok,
                Err(e) => {
                    warn!("{} notify failed: {}", symbol, e);
                    false
                }
            };
            notified.insert(symbol.to_string(), ok);
        }

        let report = PipelineReport {
            collected,
            indicators,
            signals,
            notified,
        };

        info!(
            "Daily pipeline finished: {}/{} symbols scored",
            report.succeeded().len(),
            symbols.len()
        );
        report
    }
}

/// Run the pipeline every weekday at `hour:minute` UTC, skipping market holidays.
pub async fn run_scheduler(
    pipeline: Arc<DailyPipeline>,
    symbols: Vec<String>,
    hour: u32,
    minute: u32,
) {
    info!("Scheduler started: weekdays at {:02}:{:02} UTC", hour, minute);

    loop {
        let now = Utc::now();
        let Some(next) = next_run_after(now, hour, minute) else {
            error!("Invalid schedule time {:02}:{:02}, scheduler stopped", hour, minute);
            return;
        };

        let wait = (next - now).to_std().unwrap_or_default();
        info!("Next pipeline run at {}", next);
        tokio::time::sleep(wait).await;

        let session = session_date(Utc::now());
        if !is_trading_day(session) {
            info!("{} is not a trading day, skipping run", session);
            continue;
        }

        let report = pipeline.run(&symbols).await;
        let failed: Vec<_> = report
            .signals
            .iter()
            .filter(|(_, ok)| !**ok)
            .map(|(s, _)| s.as_str())
            .collect();
        if !failed.is_empty() {
            warn!("Session {}: no signal for {:?}", session, failed);
        }
    }
}
