//! Bollinger Bands indicator.

use super::Indicator;

/// Latest band values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bands {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

impl Bands {
    /// `(upper - lower) / middle`.
    pub fn width(&self) -> f64 {
        (self.upper - self.lower) / self.middle
    }
}

/// Bollinger Bands indicator.
///
/// Consists of:
/// - Middle band: SMA(20)
/// - Upper band: SMA + 2 * StdDev
/// - Lower band: SMA - 2 * StdDev
///
/// StdDev is the sample standard deviation (n - 1) of the window.
pub struct BollingerBands {
    period: usize,
    std_dev_multiplier: f64,
}

impl Default for BollingerBands {
    fn default() -> Self {
        Self {
            period: 20,
            std_dev_multiplier: 2.0,
        }
    }
}

impl BollingerBands {
    pub fn new(period: usize, std_dev_multiplier: f64) -> Self {
        Self {
            period,
            std_dev_multiplier,
        }
    }

    /// Sample standard deviation.
    fn std_dev(values: &[f64], mean: f64) -> f64 {
        if values.len() < 2 {
            return 0.0;
        }
        let variance: f64 =
            values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
        variance.sqrt()
    }
}

impl Indicator for BollingerBands {
    type Output = Bands;

    fn id(&self) -> &str {
        "bollinger"
    }

    fn min_periods(&self) -> usize {
        self.period
    }

    fn calculate(&self, values: &[f64]) -> Option<Bands> {
        if self.period < 2 || values.len() < self.period {
            return None;
        }

        let window = &values[values.len() - self.period..];
        let middle = window.iter().sum::<f64>() / self.period as f64;
        let std_dev = Self::std_dev(window, middle);

        Some(Bands {
            upper: middle + self.std_dev_multiplier * std_dev,
            middle,
            lower: middle - self.std_dev_multiplier * std_dev,
        })
    }
}
