//! Indicator endpoints.

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};

use super::{ApiResponse, BatchResponse, HistoryQuery};
use crate::error::{AppError, Result};
use crate::types::IndicatorVector;
use crate::AppState;

/// Create the indicators router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/calculate-all", post(calculate_all))
        .route("/:symbol", get(latest))
        .route("/:symbol/history", get(history))
        .route("/:symbol/calculate", post(calculate))
}

/// Latest stored indicator vector for a symbol.
async fn latest(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<ApiResponse<IndicatorVector>>> {
    let vector = state
        .store
        .latest_indicator(&symbol)?
        .ok_or_else(|| AppError::NotFound(format!("No indicators for {}", symbol)))?;
    Ok(Json(ApiResponse::new(vector)))
}

async fn history(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<ApiResponse<Vec<IndicatorVector>>>> {
    let vectors = state.store.indicators_since(&symbol, query.since())?;
    if vectors.is_empty() {
        return Err(AppError::NotFound(format!("No indicators for {}", symbol)));
    }
    Ok(Json(ApiResponse::new(vectors)))
}

/// Recompute and store indicators for one symbol.
async fn calculate(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<ApiResponse<IndicatorVector>>> {
    let vector = state.batch().compute_indicators(&symbol.to_uppercase())?;
    Ok(Json(ApiResponse::new(vector)))
}

async fn calculate_all(State(state): State<AppState>) -> Json<BatchResponse> {
    let results = state.batch().run_indicators(&state.config.symbols);
    Json(results.into())
}
