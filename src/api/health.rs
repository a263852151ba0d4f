use crate::AppState;
use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    symbols: Vec<String>,
    scheduler_enabled: bool,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        symbols: state.config.symbols.clone(),
        scheduler_enabled: state.config.scheduler_enabled,
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/api/health", get(health))
}
