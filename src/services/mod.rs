pub mod alerts;
pub mod batch;
pub mod calendar;
pub mod discord;
pub mod indicators;
pub mod pipeline;
pub mod scoring;
pub mod sqlite_store;

pub use alerts::{AlertConfig, AlertEngine, AlertReport};
pub use batch::{BatchOrchestrator, MarketRepository};
pub use discord::{DiscordConfig, DiscordNotifier};
pub use indicators::IndicatorEngine;
pub use pipeline::{DailyPipeline, PipelineReport};
pub use scoring::{ScoringConfig, SignalScorer};
pub use sqlite_store::SqliteStore;
