//! Integration tests for the batch orchestrator

use chrono::{Duration, NaiveDate};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tickerwatch::error::{AppError, Result};
use tickerwatch::services::{BatchOrchestrator, MarketRepository, SignalScorer, SqliteStore};
use tickerwatch::types::{IndicatorVector, PriceBar, Signal};

fn bars(symbol: &str, count: i64) -> Vec<PriceBar> {
    let start = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
    (0..count)
        .map(|i| {
            let close = 50.0 + (i as f64 * 0.4).sin() * 3.0 + i as f64 * 0.2;
            PriceBar::new(symbol, start + Duration::days(i), close, close, close, close, 10_000)
        })
        .collect()
}

/// In-memory repository where selected symbols fail on read.
#[derive(Default)]
struct MockRepository {
    bars: HashMap<String, Vec<PriceBar>>,
    indicators: Mutex<HashMap<String, IndicatorVector>>,
    signals: Mutex<Vec<Signal>>,
    broken: Vec<String>,
}

impl MockRepository {
    fn with_history(symbols: &[&str], count: i64) -> Self {
        Self {
            bars: symbols
                .iter()
                .map(|s| (s.to_string(), bars(s, count)))
                .collect(),
            ..Default::default()
        }
    }

    fn check(&self, symbol: &str) -> Result<()> {
        if self.broken.iter().any(|b| b == symbol) {
            return Err(AppError::Internal(format!("lookup failed for {}", symbol)));
        }
        Ok(())
    }

    fn stored_signals(&self) -> Vec<String> {
        self.signals
            .lock()
            .unwrap()
            .iter()
            .map(|s| s.symbol.clone())
            .collect()
    }
}

impl MarketRepository for MockRepository {
    fn recent_bars(&self, symbol: &str, limit: usize) -> Result<Vec<PriceBar>> {
        self.check(symbol)?;
        let all = self.bars.get(symbol).cloned().unwrap_or_default();
        let skip = all.len().saturating_sub(limit);
        Ok(all.into_iter().skip(skip).collect())
    }

    fn latest_bar(&self, symbol: &str) -> Result<Option<PriceBar>> {
        self.check(symbol)?;
        Ok(self.bars.get(symbol).and_then(|b| b.last().cloned()))
    }

    fn latest_indicator(&self, symbol: &str) -> Result<Option<IndicatorVector>> {
        self.check(symbol)?;
        Ok(self.indicators.lock().unwrap().get(symbol).cloned())
    }

    fn upsert_indicator(&self, vector: &IndicatorVector) -> Result<()> {
        self.indicators
            .lock()
            .unwrap()
            .insert(vector.symbol.clone(), vector.clone());
        Ok(())
    }

    fn upsert_signal(&self, signal: &Signal) -> Result<()> {
        self.signals.lock().unwrap().push(signal.clone());
        Ok(())
    }
}

fn symbols(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_run_all_isolates_failures() {
    let repo = Arc::new(MockRepository {
        broken: vec!["B".to_string()],
        ..MockRepository::with_history(&["A", "B", "C"], 60)
    });
    let batch = BatchOrchestrator::new(repo.clone(), SignalScorer::default(), 260);

    batch.run_indicators(&symbols(&["A", "C"]));
    let results = batch.run_all(&symbols(&["A", "B", "C"]));

    let ordered: Vec<_> = results.iter().map(|(s, ok)| (s.as_str(), *ok)).collect();
    assert_eq!(ordered, vec![("A", true), ("B", false), ("C", true)]);
    assert_eq!(repo.stored_signals(), vec!["A", "C"]);
}

#[test]
fn test_run_all_missing_indicators_is_failure() {
    let repo = Arc::new(MockRepository::with_history(&["A", "B"], 60));
    let batch = BatchOrchestrator::new(repo.clone(), SignalScorer::default(), 260);

    batch.compute_indicators("A").unwrap();
    let results = batch.run_all(&symbols(&["A", "B", "UNKNOWN"]));

    assert_eq!(results["A"], true);
    assert_eq!(results["B"], false);
    assert_eq!(results["UNKNOWN"], false);
    assert_eq!(repo.stored_signals(), vec!["A"]);
}

#[test]
fn test_run_indicators_reports_short_history() {
    let mut repo = MockRepository::with_history(&["LONG"], 40);
    repo.bars.insert("SHORT".to_string(), bars("SHORT", 4));
    let repo = Arc::new(repo);
    let batch = BatchOrchestrator::new(repo.clone(), SignalScorer::default(), 260);

    let results = batch.run_indicators(&symbols(&["SHORT", "LONG"]));
    assert_eq!(results["SHORT"], false);
    assert_eq!(results["LONG"], true);
    assert_eq!(results.get_index(0).map(|(s, _)| s.as_str()), Some("SHORT"));

    let stored = repo.indicators.lock().unwrap();
    assert!(stored.contains_key("LONG"));
    assert!(!stored.contains_key("SHORT"));
}

#[test]
fn test_lookback_limits_window() {
    let repo = Arc::new(MockRepository::with_history(&["A"], 250));
    let batch = BatchOrchestrator::new(repo, SignalScorer::default(), 100);

    // 100 bars are not enough for MA200.
    let vector = batch.compute_indicators("A").unwrap();
    assert!(vector.ma200.is_none());
    assert!(vector.ma50.is_some());
}

#[test]
fn test_empty_symbol_list() {
    let repo = Arc::new(MockRepository::default());
    let batch = BatchOrchestrator::new(repo, SignalScorer::default(), 260);
    assert!(batch.run_all(&[]).is_empty());
}

#[test]
fn test_sqlite_end_to_end() {
    let store = Arc::new(SqliteStore::new_in_memory().unwrap());
    store.upsert_bars(&bars("QQQ", 220)).unwrap();
    store.upsert_bars(&bars("SMH", 3)).unwrap();

    let batch = BatchOrchestrator::new(store.clone(), SignalScorer::default(), 260);
    let list = symbols(&["QQQ", "SMH"]);

    let indicators = batch.run_indicators(&list);
    assert_eq!(indicators["QQQ"], true);
    assert_eq!(indicators["SMH"], false);

    let signals = batch.run_all(&list);
    assert_eq!(signals["QQQ"], true);
    assert_eq!(signals["SMH"], false);

    let signal = store.latest_signal("QQQ").unwrap().unwrap();
    let latest = store.latest_bar("QQQ").unwrap().unwrap();
    assert_eq!(signal.timestamp, latest.timestamp);
    assert!(store.latest_indicator("QQQ").unwrap().unwrap().ma200.is_some());
    assert!(store.latest_signal("SMH").unwrap().is_none());
}
