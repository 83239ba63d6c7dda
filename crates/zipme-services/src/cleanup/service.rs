use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use zipme_core::constants::METADATA_FILE_NAME;
use zipme_core::{Config, TransferMetadata, TransferToken};
use zipme_storage::{keys, ObjectEntry, Storage, StorageResult};

/// Shortest pause between two reaper passes.
const MIN_PERIOD: Duration = Duration::from_secs(1);

/// Counts from one reaper pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub scanned: usize,
    pub reaped: usize,
    pub failed: usize,
}

/// Removes pending transfers that were never verified.
///
/// A transfer's age comes from the `createdAt` of its metadata; when the metadata is
/// missing or unreadable, the newest object timestamp under the token is used instead.
#[derive(Clone)]
pub struct PendingCleanupService {
    storage: Arc<dyn Storage>,
    retention: chrono::Duration,
    period: Duration,
}

impl PendingCleanupService {
    pub fn new(storage: Arc<dyn Storage>, retention: chrono::Duration, period: Duration) -> Self {
        Self {
            storage,
            retention,
            period: period.max(MIN_PERIOD),
        }
    }

    /// Reaper settings from configuration; retention never drops below the verification TTL.
    pub fn from_config(storage: Arc<dyn Storage>, config: &Config) -> Self {
        Self::new(
            storage,
            config.pending_retention(),
            Duration::from_secs(config.pending_cleanup_interval_secs),
        )
    }

    /// Start the background reaper.
    /// Returns a JoinHandle for graceful shutdown
    pub fn start(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut cleanup_interval = interval(self.period);

            loop {
                cleanup_interval.tick().await;

                tracing::info!("Starting scheduled cleanup of abandoned pending transfers");

                match self.run_once(Utc::now()).await {
                    Ok(report) => tracing::info!(
                        scanned = report.scanned,
                        reaped = report.reaped,
                        failed = report.failed,
                        "Pending cleanup completed"
                    ),
                    Err(e) => tracing::error!(error = %e, "Pending cleanup failed"),
                }
            }
        })
    }

    /// One pass over `pending/`. Per-token failures are logged and counted, not returned.
    pub async fn run_once(&self, now: DateTime<Utc>) -> StorageResult<CleanupReport> {
        let entries = self.storage.list(&keys::pending_root()).await?;

        let mut by_token: BTreeMap<String, (TransferToken, Vec<ObjectEntry>)> = BTreeMap::new();
        for entry in entries {
            let Some(token) = keys::token_from_pending_key(&entry.key) else {
                tracing::debug!(key = %entry.key, "Skipping unrecognized pending key");
                continue;
            };
            by_token
                .entry(token.as_str().to_string())
                .or_insert_with(|| (token, Vec::new()))
                .1
                .push(entry);
        }

        let mut report = CleanupReport {
            scanned: by_token.len(),
            ..Default::default()
        };

        for (token, objects) in by_token.into_values() {
            let Some(created_at) = self.created_at(&token, &objects).await else {
                continue;
            };
            if now - created_at <= self.retention {
                continue;
            }

            let keys: Vec<String> = objects.into_iter().map(|o| o.key).collect();
            match self.storage.remove(&keys).await {
                Ok(removed) => {
                    report.reaped += 1;
                    tracing::info!(
                        token = %token,
                        removed = removed.len(),
                        created_at = %created_at,
                        "Reaped abandoned pending transfer"
                    );
                }
                Err(e) => {
                    report.failed += 1;
                    tracing::error!(token = %token, error = %e, "Failed to reap pending transfer");
                }
            }
        }

        Ok(report)
    }

    async fn created_at(
        &self,
        token: &TransferToken,
        objects: &[ObjectEntry],
    ) -> Option<DateTime<Utc>> {
        let has_metadata = objects
            .iter()
            .any(|o| o.key.ends_with(&format!("/{}", METADATA_FILE_NAME)));

        if has_metadata {
            match self
                .storage
                .download(&keys::pending_metadata_key(token))
                .await
                .ok()
                .and_then(|raw| serde_json::from_slice::<TransferMetadata>(&raw).ok())
            {
                Some(metadata) => return Some(metadata.created_at),
                None => {
                    tracing::warn!(token = %token, "Unreadable pending metadata, using object age")
                }
            }
        }

        objects.iter().filter_map(|o| o.last_modified).max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use zipme_storage::{LocalStorage, UrlSigner};

    async fn storage(dir: &tempfile::TempDir) -> Arc<dyn Storage> {
        Arc::new(
            LocalStorage::new(
                dir.path(),
                "http://localhost:3000/storage".to_string(),
                UrlSigner::new("0123456789abcdef0123456789abcdef"),
            )
            .await
            .unwrap(),
        )
    }

    async fn stage(storage: &Arc<dyn Storage>, created_at: DateTime<Utc>) -> TransferToken {
        let token = TransferToken::generate();
        let metadata = TransferMetadata::new("a@x.com".into(), "b@x.com".into(), created_at);
        storage
            .upload(
                &keys::pending_archive_key(&token),
                Bytes::from_static(b"zip"),
                "application/zip",
                true,
            )
            .await
            .unwrap();
        storage
            .upload(
                &keys::pending_metadata_key(&token),
                Bytes::from(serde_json::to_vec(&metadata).unwrap()),
                "application/json",
                true,
            )
            .await
            .unwrap();
        token
    }

    #[tokio::test]
    async fn test_reaps_only_transfers_past_retention() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(&dir).await;
        let now = Utc::now();

        let fresh = stage(&storage, now - chrono::Duration::hours(2)).await;
        let stale = stage(&storage, now - chrono::Duration::hours(30)).await;
        storage
            .upload("fid/files.zip", Bytes::from_static(b"zip"), "application/zip", true)
            .await
            .unwrap();

        let service =
            PendingCleanupService::new(storage.clone(), chrono::Duration::hours(24), Duration::from_secs(3600));
        let report = service.run_once(now).await.unwrap();

        assert_eq!(
            report,
            CleanupReport {
                scanned: 2,
                reaped: 1,
                failed: 0
            }
        );
        assert!(storage
            .list(&keys::pending_prefix(&stale))
            .await
            .unwrap()
            .is_empty());
        assert_eq!(
            storage
                .list(&keys::pending_prefix(&fresh))
                .await
                .unwrap()
                .len(),
            2
        );
        assert_eq!(storage.list("fid/").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_orphaned_archive_uses_object_age() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(&dir).await;

        let token = TransferToken::generate();
        storage
            .upload(
                &keys::pending_archive_key(&token),
                Bytes::from_static(b"zip"),
                "application/zip",
                true,
            )
            .await
            .unwrap();

        let service =
            PendingCleanupService::new(storage.clone(), chrono::Duration::hours(24), Duration::from_secs(3600));

        let report = service.run_once(Utc::now()).await.unwrap();
        assert_eq!(report.reaped, 0);

        let report = service
            .run_once(Utc::now() + chrono::Duration::hours(25))
            .await
            .unwrap();
        assert_eq!(report.reaped, 1);
        assert!(storage.list("").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_transfer_inside_verification_window_is_never_reaped() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(&dir).await;
        let now = Utc::now();
        let token = stage(&storage, now - chrono::Duration::minutes(10)).await;

        let mut config = Config::from_lookup(|key| match key {
            "STORAGE_SIGNING_SECRET" => Some("0123456789abcdef0123456789abcdef".to_string()),
            "EMAIL_ENABLED" => Some("false".to_string()),
            _ => None,
        })
        .unwrap();
        config.pending_retention_secs = 60;

        let service = PendingCleanupService::from_config(storage.clone(), &config);
        let report = service.run_once(now).await.unwrap();

        assert_eq!(report.scanned, 1);
        assert_eq!(report.reaped, 0);
        assert_eq!(
            storage
                .list(&keys::pending_prefix(&token))
                .await
                .unwrap()
                .len(),
            2
        );
    }

    #[tokio::test]
    async fn test_zero_period_does_not_stop_the_reaper() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(&dir).await;

        let service = Arc::new(PendingCleanupService::new(
            storage,
            chrono::Duration::hours(24),
            Duration::ZERO,
        ));
        let handle = service.start();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(!handle.is_finished());
        handle.abort();
    }
}
