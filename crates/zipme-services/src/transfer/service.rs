use bytes::Bytes;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use zipme_core::constants::{ARCHIVE_CONTENT_TYPE, METADATA_CONTENT_TYPE};
use zipme_core::{
    validate_submission, AppError, Config, DownloadLink, FileId, PromotedTransfer, Submission,
    TransferMetadata, TransferToken,
};
use zipme_storage::{keys, Storage, StorageError};

use crate::archive::build_zip_archive_blocking;
use crate::email::{EmailTemplate, Notifier};

pub const TOKEN_NOT_FOUND: &str = "Invalid or already used verification link";
pub const FILE_NOT_FOUND: &str = "File not found or expired";

const VERIFY_SUBJECT: &str = "Verify your email to send your files";

/// Limits and link bases used by the transfer workflow.
#[derive(Debug, Clone)]
pub struct TransferSettings {
    pub max_file_size_bytes: u64,
    pub verification_ttl: chrono::Duration,
    pub download_url_ttl: Duration,
    /// Base of API links (the verification link points here).
    pub public_base_url: String,
    /// Base of the page where recipients download the bundle.
    pub frontend_url: String,
}

impl TransferSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_file_size_bytes: config.max_file_size_bytes,
            verification_ttl: config.verification_ttl(),
            download_url_ttl: Duration::from_secs(config.download_url_ttl_secs),
            public_base_url: config.public_base_url.clone(),
            frontend_url: config.frontend_url.clone(),
        }
    }

    pub fn verify_url(&self, token: &TransferToken) -> String {
        format!("{}/api/verify?token={}", self.public_base_url, token)
    }

    pub fn download_page_url(&self, file_id: &FileId) -> String {
        format!("{}/?id={}", self.frontend_url, file_id)
    }
}

/// Pending-verification workflow: stage, verify and promote, then hand out download links.
///
/// Holds no state between calls; every step reads and writes the object store.
#[derive(Clone)]
pub struct TransferService {
    storage: Arc<dyn Storage>,
    notifier: Arc<dyn Notifier>,
    settings: TransferSettings,
}

impl TransferService {
    pub fn new(
        storage: Arc<dyn Storage>,
        notifier: Arc<dyn Notifier>,
        settings: TransferSettings,
    ) -> Self {
        Self {
            storage,
            notifier,
            settings,
        }
    }

    pub fn settings(&self) -> &TransferSettings {
        &self.settings
    }

    /// Validate, archive and stage a submission, then email the sender a verification link.
    ///
    /// The token is returned for callers that need it (tests, logs); it is never sent back
    /// over HTTP. A failed verification email leaves the staged transfer in place.
    #[tracing::instrument(skip(self, submission), fields(files = submission.files.len()))]
    pub async fn submit(&self, submission: Submission) -> Result<TransferToken, AppError> {
        validate_submission(
            submission.sender_email.as_deref(),
            submission.recipient_email.as_deref(),
            &submission.files,
            self.settings.max_file_size_bytes,
        )?;

        let Submission {
            sender_email,
            recipient_email,
            files,
        } = submission;
        let sender_email = sender_email.unwrap_or_default().trim().to_string();
        let recipient_email = recipient_email.unwrap_or_default().trim().to_string();
        let total_bytes: u64 = files.iter().map(|f| f.size()).sum();

        let start = std::time::Instant::now();
        let archive = build_zip_archive_blocking(files)
            .await
            .map_err(|e| AppError::Staging(format!("Failed to build archive: {:#}", e)))?;

        tracing::debug!(
            input_bytes = total_bytes,
            archive_bytes = archive.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Archive built"
        );

        let metadata = TransferMetadata::new(sender_email.clone(), recipient_email, Utc::now());
        let token = self.stage(Bytes::from(archive), &metadata).await?;

        let verify_url = self.settings.verify_url(&token);
        self.notifier
            .send(
                &sender_email,
                VERIFY_SUBJECT,
                &EmailTemplate::VerifyEmail { verify_url },
            )
            .await
            .map_err(|e| {
                tracing::error!(token = %token, error = %e, "Failed to send verification email");
                AppError::Notification(e.to_string())
            })?;

        tracing::info!(token = %token, "Verification email sent");
        Ok(token)
    }

    /// Write the archive and its metadata under a fresh pending token.
    pub async fn stage(
        &self,
        archive: Bytes,
        metadata: &TransferMetadata,
    ) -> Result<TransferToken, AppError> {
        let token = TransferToken::generate();
        let archive_key = keys::pending_archive_key(&token);
        let metadata_key = keys::pending_metadata_key(&token);
        let metadata_json = serde_json::to_vec(metadata)
            .map_err(|e| AppError::Staging(format!("Failed to encode metadata: {}", e)))?;

        self.storage
            .upload(&archive_key, archive, ARCHIVE_CONTENT_TYPE, true)
            .await
            .map_err(|e| {
                tracing::error!(token = %token, key = %archive_key, error = %e, "Failed to stage archive");
                AppError::Staging(e.to_string())
            })?;

        if let Err(e) = self
            .storage
            .upload(
                &metadata_key,
                Bytes::from(metadata_json),
                METADATA_CONTENT_TYPE,
                true,
            )
            .await
        {
            tracing::error!(token = %token, key = %metadata_key, error = %e, "Failed to stage metadata");
            if let Err(cleanup) = self.storage.remove(&[archive_key.clone()]).await {
                tracing::warn!(token = %token, error = %cleanup, "Failed to remove orphaned pending archive");
            }
            return Err(AppError::Staging(e.to_string()));
        }

        tracing::info!(token = %token, "Transfer staged");
        Ok(token)
    }

    /// Verify a pending transfer and promote its archive to a fresh file id.
    ///
    /// The metadata record is deleted before the archive moves, so of two concurrent calls
    /// with the same token only the one whose delete removed it goes on. If the move fails
    /// the metadata is put back so the link can be opened again.
    #[tracing::instrument(skip(self))]
    pub async fn verify(&self, raw_token: &str) -> Result<PromotedTransfer, AppError> {
        let token = TransferToken::parse(raw_token)
            .ok_or_else(|| AppError::NotFound(TOKEN_NOT_FOUND.to_string()))?;
        let metadata_key = keys::pending_metadata_key(&token);

        let raw_metadata = match self.storage.download(&metadata_key).await {
            Ok(bytes) => bytes,
            Err(StorageError::NotFound(_)) => {
                return Err(AppError::NotFound(TOKEN_NOT_FOUND.to_string()))
            }
            Err(e) => return Err(AppError::Storage(e.to_string())),
        };
        let metadata: TransferMetadata = serde_json::from_slice(&raw_metadata).map_err(|e| {
            AppError::Internal(format!("Corrupt metadata for token {}: {}", token, e))
        })?;

        let now = Utc::now();
        let ttl = self.settings.verification_ttl;
        if metadata.is_expired(now, ttl) {
            let elapsed = metadata.elapsed(now);
            tracing::info!(
                token = %token,
                elapsed_secs = elapsed.num_seconds(),
                "Verification link expired"
            );
            return Err(AppError::Expired {
                elapsed_secs: elapsed.num_seconds(),
                ttl_secs: ttl.num_seconds(),
            });
        }

        let removed = self
            .storage
            .remove(std::slice::from_ref(&metadata_key))
            .await
            .map_err(|e| AppError::Promotion(format!("Failed to claim token {}: {}", token, e)))?;
        if !removed.contains(&metadata_key) {
            tracing::info!(token = %token, "Token already claimed by another verification");
            return Err(AppError::NotFound(TOKEN_NOT_FOUND.to_string()));
        }

        let file_id = FileId::generate();
        let from_key = keys::pending_archive_key(&token);
        let to_key = keys::final_archive_key(&file_id);

        if let Err(e) = self.storage.move_object(&from_key, &to_key).await {
            tracing::error!(
                token = %token,
                file_id = %file_id,
                error = %e,
                "Failed to promote archive"
            );
            if let Err(restore) = self
                .storage
                .upload(
                    &metadata_key,
                    Bytes::from(raw_metadata),
                    METADATA_CONTENT_TYPE,
                    false,
                )
                .await
            {
                tracing::error!(token = %token, error = %restore, "Failed to restore pending metadata");
            }
            return Err(AppError::Promotion(e.to_string()));
        }

        tracing::info!(token = %token, file_id = %file_id, "Transfer promoted");

        let url = self.settings.download_page_url(&file_id);
        let subject = format!("{} shared files with you", metadata.sender_email);
        let template = EmailTemplate::SendFile {
            sender_email: metadata.sender_email.clone(),
            url,
        };
        let recipient_notified = match self
            .notifier
            .send(&metadata.recipient_email, &subject, &template)
            .await
        {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    file_id = %file_id,
                    error = %e,
                    "Transfer promoted but the recipient email could not be sent"
                );
                false
            }
        };

        Ok(PromotedTransfer {
            token,
            file_id,
            recipient_email: metadata.recipient_email,
            recipient_notified,
        })
    }

    /// Signed download URL for a promoted transfer. Does not modify storage.
    pub async fn download_url(&self, raw_file_id: &str) -> Result<DownloadLink, AppError> {
        let file_id = FileId::parse(raw_file_id)
            .ok_or_else(|| AppError::NotFound(FILE_NOT_FOUND.to_string()))?;

        let entries = self
            .storage
            .list(&keys::final_prefix(&file_id))
            .await
            .map_err(|e| AppError::Storage(e.to_string()))?;
        if entries.is_empty() {
            return Err(AppError::NotFound(FILE_NOT_FOUND.to_string()));
        }

        let ttl = self.settings.download_url_ttl;
        let issued_at = Utc::now();
        let url = self
            .storage
            .signed_url(&keys::final_archive_key(&file_id), ttl)
            .await
            .map_err(|e| match e {
                StorageError::NotFound(_) => AppError::NotFound(FILE_NOT_FOUND.to_string()),
                other => AppError::Storage(other.to_string()),
            })?;

        tracing::debug!(file_id = %file_id, ttl_secs = ttl.as_secs(), "Signed download URL issued");

        Ok(DownloadLink {
            url,
            expires_at: issued_at + chrono::Duration::seconds(ttl.as_secs() as i64),
        })
    }
}
