//! Price bar endpoints.

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};

use super::{ApiResponse, BatchResponse, HistoryQuery};
use crate::error::{AppError, Result};
use crate::types::PriceBar;
use crate::AppState;

/// Create the stocks router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(latest_prices))
        .route("/collect", post(collect))
        .route("/:symbol/history", get(history))
}

/// Latest bar of each monitored symbol.
async fn latest_prices(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<PriceBar>>>> {
    let bars = state.store.latest_bars_for(&state.config.symbols)?;
    Ok(Json(ApiResponse::new(bars)))
}

/// Bars for a symbol over the last `days` calendar days.
async fn history(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<ApiResponse<Vec<PriceBar>>>> {
    let bars = state.store.bars_since(&symbol, query.since())?;
    if bars.is_empty() {
        return Err(AppError::NotFound(format!("No price data for {}", symbol)));
    }
    Ok(Json(ApiResponse::new(bars)))
}

/// Fetch and store bars for every monitored symbol.
async fn collect(State(state): State<AppState>) -> Json<BatchResponse> {
    let results = state.pipeline.collect(&state.config.symbols).await;
    Json(results.into())
}
