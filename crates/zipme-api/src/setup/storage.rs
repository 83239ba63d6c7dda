//! Storage backend setup

use anyhow::{Context, Result};
use std::sync::Arc;
use zipme_core::{Config, StorageBackend};
use zipme_storage::{create_storage, create_url_signer, Storage, UrlSigner};

/// Build the configured backend. The local backend also yields the signer that
/// `/storage/...` uses to check its links.
pub async fn setup_storage(config: &Config) -> Result<(Arc<dyn Storage>, Option<UrlSigner>)> {
    let storage = create_storage(config)
        .await
        .context("Failed to initialize storage backend")?;

    let url_signer = match config.storage_backend {
        StorageBackend::Local => Some(create_url_signer(config)?),
        StorageBackend::S3 => None,
    };

    Ok((storage, url_signer))
}
