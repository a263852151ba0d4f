//! Yahoo Finance API client for daily stock bars.
//!
//! Uses the unofficial chart endpoint. Bars are dated by the exchange-local
//! calendar day, using the `gmtoffset` reported in the response meta.

use super::BarSource;
use crate::error::{AppError, Result};
use crate::types::PriceBar;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Yahoo Finance chart response.
#[derive(Debug, Deserialize)]
struct YahooChartResponse {
    chart: YahooChart,
}

#[derive(Debug, Deserialize)]
struct YahooChart {
    result: Option<Vec<YahooResult>>,
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
struct YahooError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct YahooResult {
    meta: YahooMeta,
    timestamp: Option<Vec<i64>>,
    indicators: YahooIndicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YahooMeta {
    symbol: String,
    /// Exchange offset from UTC in seconds.
    #[serde(default, rename = "gmtoffset")]
    gmt_offset: i64,
}

#[derive(Debug, Deserialize)]
struct YahooIndicators {
    quote: Vec<YahooQuote>,
    #[serde(default)]
    adjclose: Option<Vec<YahooAdjClose>>,
}

#[derive(Debug, Deserialize)]
struct YahooQuote {
    open: Option<Vec<Option<f64>>>,
    high: Option<Vec<Option<f64>>>,
    low: Option<Vec<Option<f64>>>,
    close: Option<Vec<Option<f64>>>,
    volume: Option<Vec<Option<i64>>>,
}

#[derive(Debug, Deserialize)]
struct YahooAdjClose {
    adjclose: Option<Vec<Option<f64>>>,
}

/// Normalize symbol for Yahoo Finance API.
/// Yahoo uses hyphens instead of dots for share classes (e.g., BRK-B not BRK.B)
fn normalize_yahoo_symbol(symbol: &str) -> String {
    symbol.to_uppercase().replace('.', "-")
}

/// Exchange-local calendar date of a UTC epoch timestamp.
fn local_date(timestamp: i64, gmt_offset: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(timestamp + gmt_offset, 0).map(|dt| dt.date_naive())
}

/// Convert a chart response into ascending bars for `symbol`.
///
/// Rows without a positive close are skipped. When a date repeats, the
/// later row wins.
fn parse_chart(symbol: &str, data: YahooChartResponse) -> Result<Vec<PriceBar>> {
    if let Some(error) = data.chart.error {
        return Err(AppError::ExternalApi(format!(
            "Yahoo API error: {} - {}",
            error.code, error.description
        )));
    }

    let result = data
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| AppError::ExternalApi(format!("No chart results for {}", symbol)))?;

    let timestamps = result.timestamp.unwrap_or_default();
    let offset = result.meta.gmt_offset;

    let quote = result
        .indicators
        .quote
        .into_iter()
        .next()
        .ok_or_else(|| AppError::ExternalApi(format!("No quote data for {}", symbol)))?;

    let adjcloses = result
        .indicators
        .adjclose
        .and_then(|a| a.into_iter().next())
        .and_then(|a| a.adjclose)
        .unwrap_or_default();

    let opens = quote.open.unwrap_or_default();
    let highs = quote.high.unwrap_or_default();
    let lows = quote.low.unwrap_or_default();
    let closes = quote.close.unwrap_or_default();
    let volumes = quote.volume.unwrap_or_default();

    let at = |series: &[Option<f64>], i: usize| series.get(i).copied().flatten();

    let mut bars: Vec<PriceBar> = Vec::with_capacity(timestamps.len());
    for (i, &timestamp) in timestamps.iter().enumerate() {
        let Some(close) = at(&closes, i).filter(|c| *c > 0.0) else {
            continue;
        };
        let Some(date) = local_date(timestamp, offset) else {
            continue;
        };

        let bar = PriceBar {
            symbol: symbol.to_uppercase(),
            timestamp: date,
            open: at(&opens, i).unwrap_or(close),
            high: at(&highs, i).unwrap_or(close),
            low: at(&lows, i).unwrap_or(close),
            close,
            volume: volumes.get(i).copied().flatten().unwrap_or(0),
            adjusted_close: at(&adjcloses, i).unwrap_or(close),
        };

        match bars.last_mut() {
            Some(last) if last.timestamp == bar.timestamp => *last = bar,
            _ => bars.push(bar),
        }
    }

    bars.sort_by_key(|b| b.timestamp);
    bars.dedup_by_key(|b| b.timestamp);

    debug!(
        "Parsed {} daily bars for {} ({})",
        bars.len(),
        symbol,
        result.meta.symbol
    );
    Ok(bars)
}

/// Yahoo Finance API client.
pub struct YahooFinanceClient {
    client: Client,
    base_url: String,
    retries: u32,
    retry_delay: Duration,
}

impl YahooFinanceClient {
    /// Create a client that makes up to `retries` attempts per request,
    /// waiting `retry_delay * attempt` between them.
    pub fn new(retries: u32, retry_delay: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()?;

        Ok(Self {
            client,
            base_url: "https://query1.finance.yahoo.com".to_string(),
            retries: retries.max(1),
            retry_delay,
        })
    }

    /// Point the client at another host (for testing).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Fetch daily bars once, without retrying.
    ///
    /// Arguments:
    /// - symbol: Stock/ETF symbol (e.g., "QQQ", "NVDA")
    /// - range: Time range ("5d", "1mo", "3mo", "6mo", "1y", "2y", "5y", "max")
    pub async fn get_daily_bars(&self, symbol: &str, range: &str) -> Result<Vec<PriceBar>> {
        let url = format!(
            "{}/v8/finance/chart/{}?range={}&interval=1d&includePrePost=false",
            self.base_url,
            normalize_yahoo_symbol(symbol),
            range
        );

        debug!("Fetching Yahoo Finance data: {}", url);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(AppError::ExternalApi(format!(
                "Yahoo API error for {}: {}",
                symbol,
                response.status()
            )));
        }

        let data: YahooChartResponse = response.json().await?;
        parse_chart(symbol, data)
    }
}

#[async_trait]
impl BarSource for YahooFinanceClient {
    async fn fetch_daily(&self, symbol: &str, range: &str) -> Result<Vec<PriceBar>> {
        let mut attempt = 1;
        loop {
            match self.get_daily_bars(symbol, range).await {
                Ok(bars) => return Ok(bars),
                Err(e) if attempt < self.retries => {
                    let wait = self.retry_delay * attempt;
                    warn!(
                        "Fetch {} attempt {}/{} failed: {}; retrying in {:?}",
                        symbol, attempt, self.retries, e, wait
                    );
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn name(&self) -> &str {
        "yahoo"
    }
}
