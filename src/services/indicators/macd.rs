//! MACD (Moving Average Convergence Divergence) indicator.

use super::ema::ema_series;
use super::Indicator;

/// Latest MACD reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacdValue {
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
}

/// MACD indicator.
///
/// - MACD Line = EMA(12) - EMA(26)
/// - Signal Line = EMA(9) of MACD Line
/// - Histogram = MACD Line - Signal Line
///
/// All three EMAs are seeded by their first input, so a value exists from the
/// first bar on; it only becomes meaningful after a few dozen bars.
pub struct Macd {
    fast_span: usize,
    slow_span: usize,
    signal_span: usize,
}

impl Default for Macd {
    fn default() -> Self {
        Self {
            fast_span: 12,
            slow_span: 26,
            signal_span: 9,
        }
    }
}

impl Indicator for Macd {
    type Output = MacdValue;

    fn id(&self) -> &str {
        "macd"
    }

    fn min_periods(&self) -> usize {
        1
    }

    fn calculate(&self, values: &[f64]) -> Option<MacdValue> {
        if values.is_empty() {
            return None;
        }

        let fast = ema_series(values, self.fast_span);
        let slow = ema_series(values, self.slow_span);
        let macd_line: Vec<f64> = fast.iter().zip(&slow).map(|(f, s)| f - s).collect();
        let signal_line = ema_series(&macd_line, self.signal_span);

        let macd = *macd_line.last()?;
        let signal = *signal_line.last()?;

        Some(MacdValue {
            macd,
            signal,
            histogram: macd - signal,
        })
    }
}
