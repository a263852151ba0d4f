//! Exponential Moving Average (EMA) indicator.

use super::Indicator;

/// EMA (Exponential Moving Average).
///
/// Recursive smoothing `ema_t = x_t * a + ema_{t-1} * (1 - a)` with
/// `a = 2 / (span + 1)`, seeded by the first value. There is no SMA warm-up,
/// so the first few values lean heavily on the seed and are unreliable until
/// roughly `span` values have been folded in.
pub struct Ema {
    span: usize,
}

impl Ema {
    pub fn new(span: usize) -> Self {
        Self { span }
    }

    fn alpha(span: usize) -> f64 {
        2.0 / (span as f64 + 1.0)
    }
}

/// Full EMA series, one value per input value.
pub fn ema_series(values: &[f64], span: usize) -> Vec<f64> {
    let alpha = Ema::alpha(span);
    let mut series = Vec::with_capacity(values.len());

    let mut iter = values.iter();
    let Some(&seed) = iter.next() else {
        return series;
    };
    series.push(seed);

    let mut ema = seed;
    for &value in iter {
        ema = value * alpha + ema * (1.0 - alpha);
        series.push(ema);
    }

    series
}

impl Indicator for Ema {
    type Output = f64;

    fn id(&self) -> &str {
        match self.span {
            12 => "ema12",
            26 => "ema26",
            _ => "ema",
        }
    }

    fn min_periods(&self) -> usize {
        1
    }

    fn calculate(&self, values: &[f64]) -> Option<f64> {
        ema_series(values, self.span).last().copied()
    }
}
