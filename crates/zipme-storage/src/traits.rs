//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::time::Duration;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Move failed: {0}")]
    MoveFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Object already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// One object returned by `Storage::list`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectEntry {
    pub key: String,
    pub size: u64,
    pub last_modified: Option<DateTime<Utc>>,
}

/// Storage abstraction trait
///
/// Path-addressable blob storage. Writes are atomic per key; there are no cross-key
/// transactions, so callers coordinate multi-key changes themselves.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Store `data` under `key`.
    ///
    /// With `upsert == false` an existing object is left untouched and
    /// `StorageError::AlreadyExists` is returned.
    async fn upload(
        &self,
        key: &str,
        data: Bytes,
        content_type: &str,
        upsert: bool,
    ) -> StorageResult<()>;

    /// Download an object. Missing objects yield `StorageError::NotFound`.
    async fn download(&self, key: &str) -> StorageResult<Vec<u8>>;

    /// List every object below `prefix`, recursively, sorted by key.
    ///
    /// The prefix is matched on whole path segments: `abc` covers `abc/x` but not `abcd/x`.
    /// An empty prefix lists the whole store.
    async fn list(&self, prefix: &str) -> StorageResult<Vec<ObjectEntry>>;

    /// Relocate an object. Backends without a native move copy then delete the source,
    /// so both keys may exist briefly.
    async fn move_object(&self, from_key: &str, to_key: &str) -> StorageResult<()>;

    /// Remove objects, skipping the ones that do not exist.
    ///
    /// Returns the keys that were actually removed by this call.
    async fn remove(&self, keys: &[String]) -> StorageResult<Vec<String>>;

    /// Time-limited, tamper-resistant GET URL for an existing object.
    async fn signed_url(&self, key: &str, expires_in: Duration) -> StorageResult<String>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
