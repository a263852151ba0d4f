pub mod yahoo;

pub use yahoo::YahooFinanceClient;

use crate::error::Result;
use crate::types::PriceBar;
use async_trait::async_trait;

/// A provider of daily bars.
#[async_trait]
pub trait BarSource: Send + Sync {
    /// Daily bars for `symbol` over a provider range such as `"5d"` or `"1y"`,
    /// ascending by date.
    async fn fetch_daily(&self, symbol: &str, range: &str) -> Result<Vec<PriceBar>>;

    fn name(&self) -> &str;
}
