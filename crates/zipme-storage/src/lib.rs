//! ZipMe Storage Library
//!
//! Object storage abstraction and its S3 and local filesystem implementations.
//!
//! # Storage key format
//!
//! All backends share one key layout, generated by the `keys` module:
//!
//! - **Pending archive**: `pending/{token}/files.zip`
//! - **Pending metadata**: `pending/{token}/metadata.json`
//! - **Final archive**: `{file_id}/files.zip`
//!
//! Keys must not contain `..` or a leading `/`.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod signing;
pub mod traits;

// Re-export commonly used types
#[cfg(feature = "storage-local")]
pub use factory::create_url_signer;
pub use factory::create_storage;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use signing::{SignatureError, UrlSigner};
pub use traits::{ObjectEntry, Storage, StorageError, StorageResult};
pub use zipme_core::StorageBackend;
