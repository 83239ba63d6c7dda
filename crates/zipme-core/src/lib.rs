//! ZipMe Core Library
//!
//! This crate provides the domain models, error types, configuration, and validation
//! shared by every ZipMe component.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod storage_types;
pub mod validation;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{
    DownloadLink, FileId, PromotedTransfer, Submission, TransferMetadata, TransferToken,
    UploadedFile,
};
pub use storage_types::StorageBackend;
pub use validation::validate_submission;
