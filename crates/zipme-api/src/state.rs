use std::sync::Arc;
use zipme_core::Config;
use zipme_services::{Notifier, TransferService, TransferSettings};
use zipme_storage::{Storage, UrlSigner};

/// Shared state handed to every handler.
pub struct AppState {
    pub config: Config,
    pub storage: Arc<dyn Storage>,
    pub transfers: TransferService,
    /// Verifies `/storage/...` links; only present for the local backend.
    pub url_signer: Option<UrlSigner>,
}

impl AppState {
    pub fn new(
        config: Config,
        storage: Arc<dyn Storage>,
        notifier: Arc<dyn Notifier>,
        url_signer: Option<UrlSigner>,
    ) -> Self {
        let transfers = TransferService::new(
            storage.clone(),
            notifier,
            TransferSettings::from_config(&config),
        );
        Self {
            config,
            storage,
            transfers,
            url_signer,
        }
    }
}
