//! Tickerwatch - daily stock indicator and trading signal service

pub mod api;
pub mod config;
pub mod error;
pub mod services;
pub mod sources;
pub mod types;

use config::Config;
use services::{
    AlertEngine, BatchOrchestrator, DailyPipeline, DiscordNotifier, SignalScorer, SqliteStore,
};
use sources::BarSource;
use std::sync::Arc;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<SqliteStore>,
    pub pipeline: Arc<DailyPipeline>,
}

impl AppState {
    /// Wire the batch, alerting and notification services around a store and
    /// a market-data source.
    pub fn new(
        config: Arc<Config>,
        store: Arc<SqliteStore>,
        source: Arc<dyn BarSource>,
    ) -> error::Result<Self> {
        let batch = BatchOrchestrator::new(
            store.clone(),
            SignalScorer::new(config.scoring()),
            config.lookback_bars,
        );
        let notifier = Arc::new(DiscordNotifier::new(config.discord())?);
        let pipeline = DailyPipeline::new(
            store.clone(),
            source,
            batch,
            AlertEngine::new(config.alerts()),
            notifier,
            config.fetch_spacing,
        );

        Ok(Self {
            config,
            store,
            pipeline: Arc::new(pipeline),
        })
    }

    pub fn batch(&self) -> &BatchOrchestrator {
        self.pipeline.batch()
    }
}
