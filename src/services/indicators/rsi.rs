//! Relative Strength Index (RSI) indicator.

use super::Indicator;

/// RSI (Relative Strength Index).
///
/// Averages the gains and the losses of the last `period` close-to-close
/// differences with a plain rolling mean, then
/// `RSI = 100 - 100 / (1 + avg_gain / avg_loss)`. Values range from 0-100:
/// - Below 30: Oversold
/// - Above 70: Overbought
///
/// A zero average loss is replaced by `f64::EPSILON` before dividing, so a
/// window of pure gains lands within floating-point noise of 100. A window
/// with neither gains nor losses therefore reads 0, not 50.
pub struct Rsi {
    period: usize,
}

impl Default for Rsi {
    fn default() -> Self {
        Self { period: 14 }
    }
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        Self { period }
    }
}

impl Indicator for Rsi {
    type Output = f64;

    fn id(&self) -> &str {
        "rsi"
    }

    fn min_periods(&self) -> usize {
        self.period + 1
    }

    fn calculate(&self, values: &[f64]) -> Option<f64> {
        if self.period == 0 || values.len() < self.min_periods() {
            return None;
        }

        let window = &values[values.len() - self.min_periods()..];
        let (gains, losses) = window
            .windows(2)
            .map(|pair| pair[1] - pair[0])
            .fold((0.0, 0.0), |(gains, losses), change: f64| {
                (gains + change.max(0.0), losses + (-change).max(0.0))
            });

        let avg_gain = gains / self.period as f64;
        let avg_loss = losses / self.period as f64;

        let divisor = if avg_loss == 0.0 { f64::EPSILON } else { avg_loss };
        let rs = avg_gain / divisor;
        Some(100.0 - (100.0 / (1.0 + rs)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uptrend(count: usize) -> Vec<f64> {
        (0..count).map(|i| 100.0 + i as f64 * 1.5).collect()
    }

    fn downtrend(count: usize) -> Vec<f64> {
        (0..count).map(|i| 200.0 - i as f64 * 1.5).collect()
    }

    #[test]
    fn test_rsi_min_periods() {
        assert_eq!(Rsi::default().min_periods(), 15);
        assert_eq!(Rsi::new(7).min_periods(), 8);
    }

    #[test]
    fn test_rsi_insufficient_data() {
        assert_eq!(Rsi::default().calculate(&uptrend(14)), None);
        assert!(Rsi::default().calculate(&uptrend(15)).is_some());
    }

    #[test]
    fn test_rsi_known_value() {
        // Alternating +2 / -1 over 14 differences: 7 gains of 2, 7 losses of 1.
        let mut closes = vec![100.0];
        for i in 0..14 {
            let last = *closes.last().unwrap();
            closes.push(if i % 2 == 0 { last + 2.0 } else { last - 1.0 });
        }
        let rsi = Rsi::default().calculate(&closes).unwrap();
        // RS = (14/14) / (7/14) = 2 -> RSI = 66.67
        assert!((rsi - 200.0 / 3.0).abs() < 1e-9, "got {}", rsi);
    }

    #[test]
    fn test_rsi_only_uses_last_window() {
        let mut closes = downtrend(40);
        let base = closes[39];
        closes.extend(uptrend(15).iter().map(|v| v - 100.0 + base));
        let rsi = Rsi::default().calculate(&closes).unwrap();
        assert!(rsi > 99.99, "got {}", rsi);
    }

    #[test]
    fn test_rsi_zero_loss_saturates_via_epsilon() {
        let rsi = Rsi::default().calculate(&uptrend(30)).unwrap();
        assert!(rsi <= 100.0);
        assert!((100.0 - rsi) < 1e-9, "got {}", rsi);
    }

    #[test]
    fn test_rsi_flat_window_reads_zero() {
        // Known approximation: no gains and no losses gives 0 / epsilon = 0.
        let closes = vec![50.0; 20];
        assert_eq!(Rsi::default().calculate(&closes), Some(0.0));
    }

    #[test]
    fn test_rsi_downtrend_low_value() {
        let rsi = Rsi::default().calculate(&downtrend(50)).unwrap();
        assert!(rsi < 1e-9, "got {}", rsi);
    }
}
