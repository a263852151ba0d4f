//! Technical indicator implementations and the engine that assembles them
//! into an [`IndicatorVector`].

pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;

pub use bollinger::{Bands, BollingerBands};
pub use ema::{ema_series, Ema};
pub use macd::{Macd, MacdValue};
pub use rsi::Rsi;
pub use sma::Sma;

use crate::error::IndicatorError;
use crate::types::{IndicatorVector, PriceBar};
use tracing::debug;

/// Trait for implementing technical indicators over a value series.
pub trait Indicator {
    type Output;

    /// Unique identifier for this indicator.
    fn id(&self) -> &str;

    /// Minimum number of values required for calculation.
    fn min_periods(&self) -> usize;

    /// Calculate the indicator as of the last value.
    /// Returns None if there are fewer than `min_periods` values.
    fn calculate(&self, values: &[f64]) -> Option<Self::Output>;
}

/// Minimum number of bars for the mandatory path (MA5).
pub const MIN_BARS: usize = 5;

/// Computes the fixed indicator set as of the last bar of a window.
pub struct IndicatorEngine {
    moving_averages: [Sma; 5],
    rsi: Rsi,
    macd: Macd,
    bollinger: BollingerBands,
    volume_average: Sma,
}

impl Default for IndicatorEngine {
    fn default() -> Self {
        Self {
            moving_averages: [
                Sma::new(5),
                Sma::new(10),
                Sma::new(20),
                Sma::new(50),
                Sma::new(200),
            ],
            rsi: Rsi::default(),
            macd: Macd::default(),
            bollinger: BollingerBands::default(),
            volume_average: Sma::new(20),
        }
    }
}

impl IndicatorEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute the indicator vector as of the last bar.
    ///
    /// `bars` must be ascending by date for one symbol. Fewer than
    /// [`MIN_BARS`] bars is an error; indicators whose window is longer than
    /// the history are simply left absent.
    pub fn compute(&self, bars: &[PriceBar]) -> Result<IndicatorVector, IndicatorError> {
        if bars.len() < MIN_BARS {
            return Err(IndicatorError::InsufficientData {
                bars: bars.len(),
                required: MIN_BARS,
            });
        }

        if let Some(index) = bars
            .windows(2)
            .position(|pair| pair[0].timestamp >= pair[1].timestamp)
        {
            return Err(IndicatorError::OutOfOrder { index: index + 1 });
        }

        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let volumes: Vec<f64> = bars.iter().map(|b| b.volume as f64).collect();

        // Checked non-empty above.
        let last = &bars[bars.len() - 1];
        let mut vector = IndicatorVector::new(last.symbol.clone(), last.timestamp);

        let [ma5, ma10, ma20, ma50, ma200] = &self.moving_averages;
        vector.ma5 = ma5.calculate(&closes);
        vector.ma10 = ma10.calculate(&closes);
        vector.ma20 = ma20.calculate(&closes);
        vector.ma50 = ma50.calculate(&closes);
        vector.ma200 = ma200.calculate(&closes);

        vector.rsi14 = self.rsi.calculate(&closes);

        if let Some(macd) = self.macd.calculate(&closes) {
            vector.macd = Some(macd.macd);
            vector.macd_signal = Some(macd.signal);
            vector.macd_hist = Some(macd.histogram);
        }

        if let Some(bands) = self.bollinger.calculate(&closes) {
            vector.bb_upper = Some(bands.upper);
            vector.bb_mid = Some(bands.middle);
            vector.bb_lower = Some(bands.lower);
        }

        vector.volume_avg20 = self.volume_average.calculate(&volumes);

        debug!(
            "Computed indicators for {} as of {} from {} bars (pending: {:?})",
            vector.symbol,
            vector.timestamp,
            bars.len(),
            self.pending(closes.len())
        );

        Ok(vector)
    }

    /// Ids of the price indicators whose window is longer than `len` closes.
    pub fn pending(&self, len: usize) -> Vec<&str> {
        let mut ids: Vec<&str> = self
            .moving_averages
            .iter()
            .filter(|ma| ma.min_periods() > len)
            .map(|ma| ma.id())
            .collect();

        if self.rsi.min_periods() > len {
            ids.push(self.rsi.id());
        }
        if self.macd.min_periods() > len {
            ids.push(self.macd.id());
        }
        if self.bollinger.min_periods() > len {
            ids.push(self.bollinger.id());
        }
        ids
    }
}
