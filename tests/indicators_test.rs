//! Integration tests for the indicator engine

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;
use tickerwatch::error::IndicatorError;
use tickerwatch::services::indicators::{IndicatorEngine, MIN_BARS};
use tickerwatch::types::PriceBar;

fn bars_from_closes(closes: &[f64]) -> Vec<PriceBar> {
    let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            PriceBar::new(
                "QQQ",
                start + Duration::days(i as i64),
                close,
                close * 1.01,
                close * 0.99,
                close,
                1_000_000 + i as i64 * 1000,
            )
        })
        .collect()
}

fn wave(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0 + i as f64 * 0.1)
        .collect()
}

// =========================================================================
// Insufficient data boundary
// =========================================================================

#[test]
fn test_four_bars_is_insufficient() {
    let engine = IndicatorEngine::new();
    let err = engine.compute(&bars_from_closes(&[1.0, 2.0, 3.0, 4.0])).unwrap_err();
    assert_eq!(
        err,
        IndicatorError::InsufficientData {
            bars: 4,
            required: MIN_BARS
        }
    );
}

#[test]
fn test_empty_is_insufficient() {
    let engine = IndicatorEngine::new();
    assert!(matches!(
        engine.compute(&[]),
        Err(IndicatorError::InsufficientData { bars: 0, .. })
    ));
}

#[test]
fn test_five_bars_only_ma5() {
    let engine = IndicatorEngine::new();
    let v = engine
        .compute(&bars_from_closes(&[10.0, 11.0, 12.0, 13.0, 14.0]))
        .unwrap();

    assert_eq!(v.ma5, Some(12.0));
    assert!(v.ma10.is_none());
    assert!(v.ma20.is_none());
    assert!(v.ma50.is_none());
    assert!(v.ma200.is_none());
    assert!(v.rsi14.is_none());
    assert!(v.bands().is_none());
    assert!(v.volume_avg20.is_none());
    // EMA recurrences are seeded by the first close, so MACD exists early
    // but carries little information this soon.
    assert!(v.macd.is_some());
    assert!(v.macd_signal.is_some());
}

#[test]
fn test_vector_keyed_by_last_bar() {
    let bars = bars_from_closes(&wave(30));
    let v = IndicatorEngine::new().compute(&bars).unwrap();
    assert_eq!(v.symbol, "QQQ");
    assert_eq!(v.timestamp, bars[29].timestamp);
}

#[test]
fn test_out_of_order_rejected() {
    let mut bars = bars_from_closes(&wave(10));
    bars.swap(3, 4);
    assert_eq!(
        IndicatorEngine::new().compute(&bars),
        Err(IndicatorError::OutOfOrder { index: 4 })
    );
}

#[test]
fn test_duplicate_date_rejected() {
    let mut bars = bars_from_closes(&wave(10));
    bars[6].timestamp = bars[5].timestamp;
    assert!(matches!(
        IndicatorEngine::new().compute(&bars),
        Err(IndicatorError::OutOfOrder { index: 6 })
    ));
}

#[test]
fn test_pending_indicators_by_history() {
    let engine = IndicatorEngine::new();
    assert_eq!(
        engine.pending(5),
        vec!["ma10", "ma20", "ma50", "ma200", "rsi", "bollinger"]
    );
    assert_eq!(engine.pending(20), vec!["ma50", "ma200"]);
    assert!(engine.pending(200).is_empty());
}

// =========================================================================
// Optional fields
// =========================================================================

#[test]
fn test_bollinger_absent_below_twenty_bars() {
    let engine = IndicatorEngine::new();
    let closes = wave(40);

    for n in MIN_BARS..20 {
        let v = engine.compute(&bars_from_closes(&closes[..n])).unwrap();
        assert!(v.bb_upper.is_none(), "n = {}", n);
        assert!(v.bb_mid.is_none(), "n = {}", n);
        assert!(v.bb_lower.is_none(), "n = {}", n);
    }

    for n in 20..=40 {
        let v = engine.compute(&bars_from_closes(&closes[..n])).unwrap();
        let (upper, mid, lower) = v.bands().unwrap();
        assert!(upper > mid && mid > lower, "n = {}", n);
        assert_eq!(v.bb_mid, v.ma20);
    }
}

#[test]
fn test_bollinger_known_values() {
    let closes: Vec<f64> = (1..=20).map(f64::from).collect();
    let v = IndicatorEngine::new().compute(&bars_from_closes(&closes)).unwrap();

    // Sample variance of 1..=20 is 35.
    let std = 35f64.sqrt();
    assert!((v.bb_mid.unwrap() - 10.5).abs() < 1e-9);
    assert!((v.bb_upper.unwrap() - (10.5 + 2.0 * std)).abs() < 1e-9);
    assert!((v.bb_lower.unwrap() - (10.5 - 2.0 * std)).abs() < 1e-9);
}

#[test]
fn test_flat_series_collapses_bands() {
    let v = IndicatorEngine::new()
        .compute(&bars_from_closes(&[50.0; 25]))
        .unwrap();
    assert_eq!(v.bb_upper, v.bb_lower);
    // No losses in the window: the epsilon substitution reads 0 when gains are 0 too.
    assert_eq!(v.rsi14, Some(0.0));
}

#[test]
fn test_ma200_needs_two_hundred_bars() {
    let engine = IndicatorEngine::new();
    let closes = wave(200);

    let v = engine.compute(&bars_from_closes(&closes[..199])).unwrap();
    assert!(v.ma200.is_none());
    assert!(v.ma50.is_some());

    let v = engine.compute(&bars_from_closes(&closes)).unwrap();
    let expected = closes.iter().sum::<f64>() / 200.0;
    assert!((v.ma200.unwrap() - expected).abs() < 1e-9);
}

#[test]
fn test_volume_average() {
    let bars = bars_from_closes(&wave(25));
    let v = IndicatorEngine::new().compute(&bars).unwrap();
    let expected = bars[5..].iter().map(|b| b.volume as f64).sum::<f64>() / 20.0;
    assert!((v.volume_avg20.unwrap() - expected).abs() < 1e-6);
}

#[test]
fn test_rsi_needs_fifteen_closes() {
    let engine = IndicatorEngine::new();
    let closes = wave(15);
    assert!(engine
        .compute(&bars_from_closes(&closes[..14]))
        .unwrap()
        .rsi14
        .is_none());
    assert!(engine.compute(&bars_from_closes(&closes)).unwrap().rsi14.is_some());
}

#[test]
fn test_rising_series_saturates_rsi() {
    let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
    let v = IndicatorEngine::new().compute(&bars_from_closes(&closes)).unwrap();
    let rsi = v.rsi14.unwrap();
    assert!(rsi > 99.999 && rsi <= 100.0);
}

// =========================================================================
// Properties
// =========================================================================

proptest! {
    #[test]
    fn prop_rsi_within_bounds(closes in prop::collection::vec(1.0f64..1000.0, 15..80)) {
        let v = IndicatorEngine::new().compute(&bars_from_closes(&closes)).unwrap();
        let rsi = v.rsi14.unwrap();
        prop_assert!((0.0..=100.0).contains(&rsi), "rsi = {}", rsi);
    }

    #[test]
    fn prop_compute_is_deterministic(closes in prop::collection::vec(1.0f64..1000.0, 5..120)) {
        let engine = IndicatorEngine::new();
        let bars = bars_from_closes(&closes);
        prop_assert_eq!(engine.compute(&bars).unwrap(), engine.compute(&bars).unwrap());
    }

    #[test]
    fn prop_bands_ordered(closes in prop::collection::vec(1.0f64..1000.0, 20..60)) {
        let v = IndicatorEngine::new().compute(&bars_from_closes(&closes)).unwrap();
        let (upper, mid, lower) = v.bands().unwrap();
        prop_assert!(upper >= mid && mid >= lower);
    }
}
