//! Per-symbol batch runs of the indicator engine and the signal scorer.

use crate::error::Result;
use crate::services::indicators::IndicatorEngine;
use crate::services::scoring::SignalScorer;
use crate::types::{IndicatorVector, PriceBar, Signal};
use indexmap::IndexMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Storage the batch reads bars and indicators from and writes results to.
pub trait MarketRepository: Send + Sync {
    /// Up to `limit` most recent bars for `symbol`, ascending by date.
    fn recent_bars(&self, symbol: &str, limit: usize) -> Result<Vec<PriceBar>>;

    fn latest_bar(&self, symbol: &str) -> Result<Option<PriceBar>>;

    fn latest_indicator(&self, symbol: &str) -> Result<Option<IndicatorVector>>;

    fn upsert_indicator(&self, vector: &IndicatorVector) -> Result<()>;

    fn upsert_signal(&self, signal: &Signal) -> Result<()>;
}

/// Runs indicators and scoring across symbols with continue-on-error.
#[derive(Clone)]
pub struct BatchOrchestrator {
    repo: Arc<dyn MarketRepository>,
    engine: Arc<IndicatorEngine>,
    scorer: SignalScorer,
    lookback: usize,
}

impl BatchOrchestrator {
    pub fn new(repo: Arc<dyn MarketRepository>, scorer: SignalScorer, lookback: usize) -> Self {
        Self {
            repo,
            engine: Arc::new(IndicatorEngine::new()),
            scorer,
            lookback,
        }
    }

    /// Compute and store the indicator vector for `symbol` as of its latest bar.
    pub fn compute_indicators(&self, symbol: &str) -> Result<IndicatorVector> {
        let bars = self.repo.recent_bars(symbol, self.lookback)?;
        let vector = self.engine.compute(&bars)?;
        self.repo.upsert_indicator(&vector)?;
        Ok(vector)
    }

    /// Score the latest bar against the latest indicators and store the signal.
    ///
    /// Nothing is written unless a complete signal was produced.
    pub fn analyze(&self, symbol: &str) -> Result<Signal> {
        let bar = self.repo.latest_bar(symbol)?;
        let indicators = self.repo.latest_indicator(symbol)?;
        let signal = self
            .scorer
            .score_latest(bar.as_ref(), indicators.as_ref())?;
        self.repo.upsert_signal(&signal)?;
        Ok(signal)
    }

    /// Compute indicators for each symbol in order.
    pub fn run_indicators(&self, symbols: &[String]) -> IndexMap<String, bool> {
        self.run_each(symbols, "indicators", |symbol| {
            self.compute_indicators(symbol).map(|_| ())
        })
    }

    /// Score and store a signal for each symbol in order.
    ///
    /// A failing symbol is recorded as `false` and never stops the batch.
    pub fn run_all(&self, symbols: &[String]) -> IndexMap<String, bool> {
        self.run_each(symbols, "signal", |symbol| {
            let signal = self.analyze(symbol)?;
            info!(
                "{}: {} (confidence {:.2}, risk {})",
                symbol, signal.action, signal.confidence, signal.risk_level
            );
            Ok(())
        })
    }

    fn run_each<F>(&self, symbols: &[String], stage: &str, mut step: F) -> IndexMap<String, bool>
    where
        F: FnMut(&str) -> Result<()>,
    {
        let mut results = IndexMap::with_capacity(symbols.len());

        for symbol in symbols {
            let ok = match step(symbol) {
                Ok(()) => true,
                Err(e) => {
                    warn!("{} {} failed: {}", symbol, stage, e);
                    false
                }
            };
            results.insert(symbol.clone(), ok);
        }

        let succeeded = results.values().filter(|ok| **ok).count();
        info!("{} batch: {}/{} succeeded", stage, succeeded, results.len());

        results
    }
}
