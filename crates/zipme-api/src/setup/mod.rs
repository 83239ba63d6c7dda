//! Application setup and initialization

pub mod routes;
pub mod server;
pub mod services;
pub mod storage;

use crate::state::AppState;
use crate::telemetry::{init_telemetry, LogFormat};
use anyhow::{Context, Result};
use std::sync::Arc;
use zipme_core::Config;

/// Initialize the entire application. The configuration was validated when it was loaded.
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    init_telemetry(LogFormat::from_env()).context("Failed to initialize telemetry")?;

    tracing::info!(
        environment = %config.environment,
        storage_backend = %config.storage_backend,
        "Configuration loaded and validated successfully"
    );

    let (storage, url_signer) = storage::setup_storage(&config).await?;

    let state = services::initialize_services(&config, storage, url_signer)?;

    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
