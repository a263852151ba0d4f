//! Signal API endpoints.

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};

use super::{ApiResponse, BatchResponse, HistoryQuery};
use crate::error::{AppError, Result};
use crate::types::Signal;
use crate::AppState;

/// Create the signals router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/analyze-all", post(analyze_all))
        .route("/:symbol", get(latest))
        .route("/:symbol/history", get(history))
        .route("/:symbol/analyze", post(analyze))
}

/// Latest stored signal for a symbol.
async fn latest(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<ApiResponse<Signal>>> {
    let signal = state
        .store
        .latest_signal(&symbol)?
        .ok_or_else(|| AppError::NotFound(format!("No signal for {}", symbol)))?;
    Ok(Json(ApiResponse::new(signal)))
}

async fn history(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<ApiResponse<Vec<Signal>>>> {
    let signals = state.store.signals_since(&symbol, query.since())?;
    if signals.is_empty() {
        return Err(AppError::NotFound(format!("No signals for {}", symbol)));
    }
    Ok(Json(ApiResponse::new(signals)))
}

/// Score the latest bar and indicators for one symbol and store the signal.
async fn analyze(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<ApiResponse<Signal>>> {
    let signal = state.batch().analyze(&symbol.to_uppercase())?;
    Ok(Json(ApiResponse::new(signal)))
}

async fn analyze_all(State(state): State<AppState>) -> Json<BatchResponse> {
    let results = state.batch().run_all(&state.config.symbols);
    Json(results.into())
}
