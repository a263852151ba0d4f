pub mod alerts;
pub mod health;
pub mod indicators;
pub mod pipeline;
pub mod signals;
pub mod stocks;

use crate::AppState;
use axum::Router;
use chrono::{Duration, NaiveDate, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Per-symbol outcome of a batch endpoint.
#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub results: IndexMap<String, bool>,
    pub succeeded: usize,
    pub total: usize,
}

impl From<IndexMap<String, bool>> for BatchResponse {
    fn from(results: IndexMap<String, bool>) -> Self {
        Self {
            succeeded: results.values().filter(|ok| **ok).count(),
            total: results.len(),
            results,
        }
    }
}

/// Days of history to return.
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub days: Option<i64>,
}

const DEFAULT_HISTORY_DAYS: i64 = 30;
const MAX_HISTORY_DAYS: i64 = 365;

impl HistoryQuery {
    /// Requested days clamped to `1..=365`.
    pub fn days(&self) -> i64 {
        self.days
            .unwrap_or(DEFAULT_HISTORY_DAYS)
            .clamp(1, MAX_HISTORY_DAYS)
    }

    /// First calendar date included in the window.
    pub fn since(&self) -> NaiveDate {
        Utc::now().date_naive() - Duration::days(self.days())
    }
}

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .nest("/api/stocks", stocks::router())
        .nest("/api/indicators", indicators::router())
        .nest("/api/signals", signals::router())
        .nest("/api/alerts", alerts::router())
        .nest("/api/pipeline", pipeline::router())
}
