//! Alert endpoints.

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use indexmap::IndexMap;
use serde::Serialize;
use tracing::warn;

use super::ApiResponse;
use crate::error::Result;
use crate::services::AlertReport;
use crate::AppState;

/// Create the alerts router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/check-all", post(check_all))
        .route("/:symbol", get(current))
        .route("/:symbol/check", post(check))
}

#[derive(Debug, Serialize)]
pub struct AlertCheckResponse {
    #[serde(flatten)]
    pub report: AlertReport,
    pub total_alerts: usize,
    /// Whether every indicator alert was delivered to Discord.
    pub notified: bool,
}

#[derive(Debug, Serialize)]
pub struct AlertBatchResponse {
    pub results: IndexMap<String, AlertReport>,
    pub total_alerts: usize,
    /// Symbols whose alerts could not be evaluated.
    pub failed: Vec<String>,
}

/// Current alerts for a symbol, evaluated from stored data.
async fn current(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<ApiResponse<AlertReport>>> {
    let symbol = symbol.to_uppercase();
    let alerts = state.pipeline.check_alerts(&symbol)?;
    Ok(Json(ApiResponse::new(AlertReport::from_alerts(&symbol, &alerts))))
}

/// Evaluate alerts for a symbol and send its indicator alerts.
async fn check(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<AlertCheckResponse>> {
    let symbol = symbol.to_uppercase();
    let alerts = state.pipeline.check_alerts(&symbol)?;
    let notified = state.pipeline.deliver_alerts(&symbol, &alerts).await;
    let report = AlertReport::from_alerts(&symbol, &alerts);

    Ok(Json(AlertCheckResponse {
        total_alerts: report.total(),
        report,
        notified,
    }))
}

async fn check_all(State(state): State<AppState>) -> Json<AlertBatchResponse> {
    let mut results = IndexMap::new();
    let mut failed = Vec::new();

    for symbol in &state.config.symbols {
        match state.pipeline.check_alerts(symbol) {
            Ok(alerts) => {
                results.insert(symbol.clone(), AlertReport::from_alerts(symbol, &alerts));
            }
            Err(e) => {
                warn!("{} alert check failed: {}", symbol, e);
                failed.push(symbol.clone());
            }
        }
    }

    Json(AlertBatchResponse {
        total_alerts: results.values().map(AlertReport::total).sum(),
        results,
        failed,
    })
}
