//! ZipMe Services Layer
//!
//! Business services behind the HTTP API: the pending-verification transfer workflow,
//! zip archiving, transactional email, and the reaper for abandoned pending transfers.
//! Keep orchestration here; keep thin HTTP handling in zipme-api.

pub mod archive;
pub mod cleanup;
pub mod email;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;
pub mod transfer;

pub use archive::{build_zip_archive, sanitize_file_name};
pub use cleanup::{CleanupReport, PendingCleanupService};
pub use email::{create_notifier, EmailTemplate, LogNotifier, Notifier, NotifyError, SmtpNotifier};
pub use transfer::{TransferService, TransferSettings};
pub use zipme_storage::{
    create_storage, LocalStorage, S3Storage, Storage, StorageBackend, StorageError, StorageResult,
};
