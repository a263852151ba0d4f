//! Simple Moving Average (SMA) indicator.

use super::Indicator;

/// SMA (Simple Moving Average).
///
/// Arithmetic mean of the last `period` values. Used for the MA5..MA200
/// closes and for the 20-day volume average.
pub struct Sma {
    period: usize,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        Self { period }
    }
}

impl Indicator for Sma {
    type Output = f64;

    fn id(&self) -> &str {
        match self.period {
            5 => "ma5",
            10 => "ma10",
            20 => "ma20",
            50 => "ma50",
            200 => "ma200",
            _ => "ma",
        }
    }

    fn min_periods(&self) -> usize {
        self.period
    }

    fn calculate(&self, values: &[f64]) -> Option<f64> {
        if self.period == 0 || values.len() < self.period {
            return None;
        }

        let window = &values[values.len() - self.period..];
        Some(window.iter().sum::<f64>() / self.period as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sma_uses_latest_window() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        assert_eq!(Sma::new(3).calculate(&values), Some(5.0));
        assert_eq!(Sma::new(6).calculate(&values), Some(3.5));
    }

    #[test]
    fn test_sma_insufficient_data() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(Sma::new(5).calculate(&values), None);
        assert_eq!(Sma::new(0).calculate(&values), None);
    }

    #[test]
    fn test_sma_ids() {
        assert_eq!(Sma::new(5).id(), "ma5");
        assert_eq!(Sma::new(200).id(), "ma200");
        assert_eq!(Sma::new(7).id(), "ma");
    }
}
