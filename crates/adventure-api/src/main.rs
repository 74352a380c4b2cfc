//! Adventure API server entry point.

use std::net::SocketAddr;

use adventure_api::config::AppConfig;
use adventure_api::error::AppError;
use adventure_api::state::AppState;
use adventure_api::{app, telemetry};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = AppConfig::from_env()?;
    let provider = telemetry::init(config.otlp_endpoint.as_deref())?;

    tracing::info!(?config, "Starting adventure API server");

    let state = AppState::bootstrap(&config).await?;

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(state)).await?;

    if let Some(provider) = provider {
        if let Err(e) = provider.shutdown() {
            tracing::warn!(error = %e, "failed to flush spans");
        }
    }

    Ok(())
}
