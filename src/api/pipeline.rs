use axum::{extract::State, routing::post, Json, Router};

use crate::services::PipelineReport;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/run", post(run))
}

/// Run the full daily job now for every monitored symbol.
async fn run(State(state): State<AppState>) -> Json<PipelineReport> {
    Json(state.pipeline.run(&state.config.symbols).await)
}
