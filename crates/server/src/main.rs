//! Price server - house price prediction endpoint
//!
//! Loads the trained model artifact once at startup and serves
//! predictions, model metadata, health and metrics over HTTP.

use anyhow::{Context, Result};
use predictor_lib::{
    health::{components, HealthRegistry},
    observability::StructuredLogger,
    PredictionService, ServingSchema,
};
use price_server::{api, config::ServerConfig};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting price-server");

    let config = ServerConfig::load()?;
    info!(
        addr = %config.addr(),
        artifact = %config.artifact_path.display(),
        "Server configured"
    );

    let logger = StructuredLogger::new("price-server");
    let health_registry = HealthRegistry::new();

    // No request is served until this succeeds
    let service = match PredictionService::load(&config.artifact_path, ServingSchema::boston()) {
        Ok(service) => service,
        Err(e) => {
            error!(error = %e, "Failed to load model artifact");
            return Err(e).with_context(|| {
                format!("Cannot start without model artifact {:?}", config.artifact_path)
            });
        }
    };

    let info = service.model_info();
    logger.model_loaded(
        &config.artifact_path.display().to_string(),
        &info.version,
        &info.features,
        info.cv_score,
    );

    health_registry.register(components::MODEL).await;
    health_registry.register(components::API).await;

    let state = Arc::new(api::AppState::new(Arc::new(service), health_registry.clone()));
    health_registry.set_ready(true).await;

    let addr = config.addr();
    logger.service_started(SERVER_VERSION, &addr, &info.version);

    let shutdown_logger = logger.clone();
    api::serve(&addr, state, async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for shutdown signal");
        }
        shutdown_logger.service_shutdown("SIGINT received");
    })
    .await?;

    info!("Shut down");
    Ok(())
}
