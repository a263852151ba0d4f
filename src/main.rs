use axum::Router;
use std::sync::Arc;
use tickerwatch::config::Config;
use tickerwatch::services::{pipeline, SqliteStore};
use tickerwatch::sources::YahooFinanceClient;
use tickerwatch::{api, AppState};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tickerwatch=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Arc::new(Config::from_env());
    info!(
        "Starting tickerwatch on {}:{} for {:?}",
        config.host, config.port, config.symbols
    );

    let store = Arc::new(SqliteStore::new(&config.database_path)?);
    let yahoo = Arc::new(YahooFinanceClient::new(
        config.fetch_retries,
        config.fetch_retry_delay,
    )?);

    let state = AppState::new(config.clone(), store, yahoo)?;

    // Start the daily job
    if config.scheduler_enabled {
        let pipeline = state.pipeline.clone();
        let symbols = config.symbols.clone();
        let (hour, minute) = (config.schedule_hour_utc, config.schedule_minute_utc);
        tokio::spawn(async move {
            pipeline::run_scheduler(pipeline, symbols, hour, minute).await;
        });
    } else {
        info!("Scheduler disabled");
    }

    // Build CORS layer
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the router
    let app = Router::new()
        .merge(api::router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start the server
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Tickerwatch listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
