//! SQLite persistence for daily bars, indicator vectors and signals.
//!
//! Every table is keyed by `(symbol, date)` and written with upserts, so
//! re-collecting or recomputing a day replaces the previous row instead of
//! duplicating it. Symbols are stored upper-cased.

use crate::error::{AppError, Result};
use crate::services::batch::MarketRepository;
use crate::types::{IndicatorVector, PriceBar, RiskLevel, Signal, SignalAction};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

const BAR_COLUMNS: &str = "symbol, date, open, high, low, close, volume, adjusted_close";

const INDICATOR_COLUMNS: &str = "symbol, date, ma5, ma10, ma20, ma50, ma200, rsi14, macd, \
     macd_signal, macd_hist, bb_upper, bb_mid, bb_lower, volume_avg20";

const SIGNAL_COLUMNS: &str = "symbol, date, action, confidence, risk_level, reasons_json, \
     reasoning, score";

/// SQLite store for market data.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the store at the given path.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::Internal(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }

        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        info!("SQLite store initialized at {}", path.display());
        Ok(store)
    }

    /// Create an in-memory store (for testing).
    pub fn new_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        debug!("In-memory SQLite store initialized");
        Ok(store)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AppError::Internal("SQLite connection mutex poisoned".to_string()))
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS price_bars (
                symbol TEXT NOT NULL,
                date TEXT NOT NULL,
                open REAL NOT NULL,
                high REAL NOT NULL,
                low REAL NOT NULL,
                close REAL NOT NULL,
                volume INTEGER NOT NULL,
                adjusted_close REAL NOT NULL,
                PRIMARY KEY (symbol, date)
            );

            CREATE TABLE IF NOT EXISTS technical_indicators (
                symbol TEXT NOT NULL,
                date TEXT NOT NULL,
                ma5 REAL,
                ma10 REAL,
                ma20 REAL,
                ma50 REAL,
                ma200 REAL,
                rsi14 REAL,
                macd REAL,
                macd_signal REAL,
                macd_hist REAL,
                bb_upper REAL,
                bb_mid REAL,
                bb_lower REAL,
                volume_avg20 REAL,
                PRIMARY KEY (symbol, date)
            );

            CREATE TABLE IF NOT EXISTS signals (
                symbol TEXT NOT NULL,
                date TEXT NOT NULL,
                action TEXT NOT NULL,
                confidence REAL NOT NULL,
                risk_level TEXT NOT NULL,
                reasons_json TEXT NOT NULL DEFAULT '[]',
                reasoning TEXT NOT NULL,
                score INTEGER NOT NULL,
                PRIMARY KEY (symbol, date)
            );

            CREATE INDEX IF NOT EXISTS idx_price_bars_date ON price_bars(date DESC);",
        )?;

        debug!("SQLite schema initialized");
        Ok(())
    }

    // ========== Price Bars ==========

    /// Insert or replace one bar.
    pub fn upsert_bar(&self, bar: &PriceBar) -> Result<()> {
        self.upsert_bars(std::slice::from_ref(bar)).map(|_| ())
    }

    /// Insert or replace bars in one transaction. Returns the number written.
    pub fn upsert_bars(&self, bars: &[PriceBar]) -> Result<usize> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO price_bars ({BAR_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 ON CONFLICT(symbol, date) DO UPDATE SET
                    open = excluded.open,
                    high = excluded.high,
                    low = excluded.low,
                    close = excluded.close,
                    volume = excluded.volume,
                    adjusted_close = excluded.adjusted_close"
            ))?;

            for bar in bars {
                stmt.execute(params![
                    bar.symbol.to_uppercase(),
                    bar.timestamp,
                    bar.open,
                    bar.high,
                    bar.low,
                    bar.close,
                    bar.volume,
                    bar.adjusted_close,
                ])?;
            }
        }
        tx.commit()?;

        debug!("Upserted {} bars", bars.len());
        Ok(bars.len())
    }

    /// The `limit` most recent bars, ascending by date.
    pub fn recent_bars(&self, symbol: &str, limit: usize) -> Result<Vec<PriceBar>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {BAR_COLUMNS} FROM (
                SELECT {BAR_COLUMNS} FROM price_bars
                WHERE symbol = ?1 ORDER BY date DESC LIMIT ?2
             ) ORDER BY date ASC"
        ))?;

        let bars = stmt
            .query_map(params![symbol.to_uppercase(), limit as i64], bar_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(bars)
    }

    /// Bars dated on or after `since`, ascending.
    pub fn bars_since(&self, symbol: &str, since: NaiveDate) -> Result<Vec<PriceBar>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {BAR_COLUMNS} FROM price_bars
             WHERE symbol = ?1 AND date >= ?2 ORDER BY date ASC"
        ))?;

        let bars = stmt
            .query_map(params![symbol.to_uppercase(), since], bar_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(bars)
    }

    pub fn bar_count(&self, symbol: &str) -> Result<usize> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM price_bars WHERE symbol = ?1",
            params![symbol.to_uppercase()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    pub fn latest_bar(&self, symbol: &str) -> Result<Option<PriceBar>> {
        let conn = self.conn()?;
        let bar = conn
            .query_row(
                &format!(
                    "SELECT {BAR_COLUMNS} FROM price_bars
                     WHERE symbol = ?1 ORDER BY date DESC LIMIT 1"
                ),
                params![symbol.to_uppercase()],
                bar_from_row,
            )
            .optional()?;
        Ok(bar)
    }

    /// Latest bar of each symbol that has one, in input order.
    pub fn latest_bars_for(&self, symbols: &[String]) -> Result<Vec<PriceBar>> {
        let mut bars = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            if let Some(bar) = self.latest_bar(symbol)? {
                bars.push(bar);
            }
        }
        Ok(bars)
    }

    // ========== Indicators ==========

    pub fn upsert_indicator(&self, v: &IndicatorVector) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            &format!(
                "INSERT INTO technical_indicators ({INDICATOR_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
                 ON CONFLICT(symbol, date) DO UPDATE SET
                    ma5 = excluded.ma5,
                    ma10 = excluded.ma10,
                    ma20 = excluded.ma20,
                    ma50 = excluded.ma50,
                    ma200 = excluded.ma200,
                    rsi14 = excluded.rsi14,
                    macd = excluded.macd,
                    macd_signal = excluded.macd_signal,
                    macd_hist = excluded.macd_hist,
                    bb_upper = excluded.bb_upper,
                    bb_mid = excluded.bb_mid,
                    bb_lower = excluded.bb_lower,
                    volume_avg20 = excluded.volume_avg20"
            ),
            params![
                v.symbol.to_uppercase(),
                v.timestamp,
                v.ma5,
                v.ma10,
                v.ma20,
                v.ma50,
                v.ma200,
                v.rsi14,
                v.macd,
                v.macd_signal,
                v.macd_hist,
                v.bb_upper,
                v.bb_mid,
                v.bb_lower,
                v.volume_avg20,
            ],
        )?;

        debug!("Saved indicators for {} as of {}", v.symbol, v.timestamp);
        Ok(())
    }

    pub fn latest_indicator(&self, symbol: &str) -> Result<Option<IndicatorVector>> {
        let conn = self.conn()?;
        let vector = conn
            .query_row(
                &format!(
                    "SELECT {INDICATOR_COLUMNS} FROM technical_indicators
                     WHERE symbol = ?1 ORDER BY date DESC LIMIT 1"
                ),
                params![symbol.to_uppercase()],
                indicator_from_row,
            )
            .optional()?;
        Ok(vector)
    }

    pub fn indicators_since(&self, symbol: &str, since: NaiveDate) -> Result<Vec<IndicatorVector>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {INDICATOR_COLUMNS} FROM technical_indicators
             WHERE symbol = ?1 AND date >= ?2 ORDER BY date ASC"
        ))?;

        let rows = stmt
            .query_map(params![symbol.to_uppercase(), since], indicator_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    // ========== Signals ==========

    pub fn upsert_signal(&self, signal: &Signal) -> Result<()> {
        let reasons_json = serde_json::to_string(&signal.reasons)?;
        let conn = self.conn()?;
        conn.execute(
            &format!(
                "INSERT INTO signals ({SIGNAL_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 ON CONFLICT(symbol, date) DO UPDATE SET
                    action = excluded.action,
                    confidence = excluded.confidence,
                    risk_level = excluded.risk_level,
                    reasons_json = excluded.reasons_json,
                    reasoning = excluded.reasoning,
                    score = excluded.score"
            ),
            params![
                signal.symbol.to_uppercase(),
                signal.timestamp,
                signal.action.as_str(),
                signal.confidence,
                signal.risk_level.as_str(),
                reasons_json,
                signal.reasoning,
                signal.score,
            ],
        )?;

        debug!(
            "Saved {} signal for {} as of {}",
            signal.action, signal.symbol, signal.timestamp
        );
        Ok(())
    }

    pub fn latest_signal(&self, symbol: &str) -> Result<Option<Signal>> {
        let conn = self.conn()?;
        let signal = conn
            .query_row(
                &format!(
                    "SELECT {SIGNAL_COLUMNS} FROM signals
                     WHERE symbol = ?1 ORDER BY date DESC LIMIT 1"
                ),
                params![symbol.to_uppercase()],
                signal_from_row,
            )
            .optional()?;
        Ok(signal)
    }

    pub fn signals_since(&self, symbol: &str, since: NaiveDate) -> Result<Vec<Signal>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {SIGNAL_COLUMNS} FROM signals
             WHERE symbol = ?1 AND date >= ?2 ORDER BY date ASC"
        ))?;

        let rows = stmt
            .query_map(params![symbol.to_uppercase(), since], signal_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Delete all bars, indicators and signals.
    pub fn clear_market_data(&self) -> Result<()> {
        let conn = self.conn()?;
        conn.execute_batch(
            "DELETE FROM signals;
             DELETE FROM technical_indicators;
             DELETE FROM price_bars;",
        )?;
        warn!("Cleared all market data");
        Ok(())
    }
}

impl MarketRepository for SqliteStore {
    fn recent_bars(&self, symbol: &str, limit: usize) -> Result<Vec<PriceBar>> {
        SqliteStore::recent_bars(self, symbol, limit)
    }

    fn latest_bar(&self, symbol: &str) -> Result<Option<PriceBar>> {
        SqliteStore::latest_bar(self, symbol)
    }

    fn latest_indicator(&self, symbol: &str) -> Result<Option<IndicatorVector>> {
        SqliteStore::latest_indicator(self, symbol)
    }

    fn upsert_indicator(&self, vector: &IndicatorVector) -> Result<()> {
        SqliteStore::upsert_indicator(self, vector)
    }

    fn upsert_signal(&self, signal: &Signal) -> Result<()> {
        SqliteStore::upsert_signal(self, signal)
    }
}

fn bar_from_row(row: &Row<'_>) -> rusqlite::Result<PriceBar> {
    Ok(PriceBar {
        symbol: row.get(0)?,
        timestamp: row.get(1)?,
        open: row.get(2)?,
        high: row.get(3)?,
        low: row.get(4)?,
        close: row.get(5)?,
        volume: row.get(6)?,
        adjusted_close: row.get(7)?,
    })
}

fn indicator_from_row(row: &Row<'_>) -> rusqlite::Result<IndicatorVector> {
    Ok(IndicatorVector {
        symbol: row.get(0)?,
        timestamp: row.get(1)?,
        ma5: row.get(2)?,
        ma10: row.get(3)?,
        ma20: row.get(4)?,
        ma50: row.get(5)?,
        ma200: row.get(6)?,
        rsi14: row.get(7)?,
        macd: row.get(8)?,
        macd_signal: row.get(9)?,
        macd_hist: row.get(10)?,
        bb_upper: row.get(11)?,
        bb_mid: row.get(12)?,
        bb_lower: row.get(13)?,
        volume_avg20: row.get(14)?,
    })
}

fn signal_from_row(row: &Row<'_>) -> rusqlite::Result<Signal> {
    let action: String = row.get(2)?;
    let risk: String = row.get(4)?;
    let reasons_json: String = row.get(5)?;

    Ok(Signal {
        symbol: row.get(0)?,
        timestamp: row.get(1)?,
        action: parse_column(2, &action, SignalAction::parse)?,
        confidence: row.get(3)?,
        risk_level: parse_column(4, &risk, RiskLevel::parse)?,
        reasons: serde_json::from_str(&reasons_json).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
        })?,
        reasoning: row.get(6)?,
        score: row.get(7)?,
    })
}

fn parse_column<T>(
    index: usize,
    value: &str,
    parse: fn(&str) -> Option<T>,
) -> rusqlite::Result<T> {
    parse(value).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            index,
            rusqlite::types::Type::Text,
            format!("unexpected value {:?}", value).into(),
        )
    })
}
