use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;

use trendcast_backend::app;
use trendcast_backend::config::AppConfig;
use trendcast_backend::external::build_provider;
use trendcast_backend::logging::{init_logging, LoggingConfig};
use trendcast_backend::services::prediction_service::PredictionService;
use trendcast_backend::services::regression::OrdinaryLeastSquares;
use trendcast_backend::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging FIRST
    init_logging(LoggingConfig::from_env())?;

    let config = AppConfig::from_env().context("invalid configuration")?;

    let provider = build_provider(&config.provider, config.prediction.adjusted_close);
    tracing::info!(
        "Using price provider '{}' for window {} to {} (min rows {}, train ratio {})",
        provider.name(),
        config.prediction.window.start,
        config.prediction.window.end,
        config.prediction.min_history_rows,
        config.prediction.train_ratio
    );

    let state = AppState {
        prediction: PredictionService::new(provider, Arc::new(OrdinaryLeastSquares), config.prediction),
    };
    let app = app::create_app(state);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!("Trendcast backend running at http://{}/", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
