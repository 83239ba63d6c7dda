//! Service wiring: notifier, transfer workflow, pending cleanup.

use crate::state::AppState;
use anyhow::{Context, Result};
use std::sync::Arc;
use zipme_core::Config;
use zipme_services::{create_notifier, PendingCleanupService};
use zipme_storage::{Storage, UrlSigner};

pub fn initialize_services(
    config: &Config,
    storage: Arc<dyn Storage>,
    url_signer: Option<UrlSigner>,
) -> Result<Arc<AppState>> {
    let notifier = create_notifier(config).context("Failed to initialize email service")?;

    if config.pending_cleanup_enabled {
        let cleanup = Arc::new(PendingCleanupService::from_config(storage.clone(), config));
        cleanup.start();
        tracing::info!(
            interval_secs = config.pending_cleanup_interval_secs,
            retention_secs = config.pending_retention().num_seconds(),
            "Pending cleanup service started"
        );
    } else {
        tracing::info!("Pending cleanup disabled (PENDING_CLEANUP_ENABLED=false)");
    }

    Ok(Arc::new(AppState::new(
        config.clone(),
        storage,
        notifier,
        url_signer,
    )))
}
