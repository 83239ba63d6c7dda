//! Storage layout and default limits.

/// Name of the zip bundle inside both the pending and the final prefix.
pub const ARCHIVE_FILE_NAME: &str = "files.zip";

/// Name of the JSON record stored next to a pending archive.
pub const METADATA_FILE_NAME: &str = "metadata.json";

/// Root prefix for transfers that are waiting for sender verification.
pub const PENDING_PREFIX: &str = "pending";

pub const ARCHIVE_CONTENT_TYPE: &str = "application/zip";
pub const METADATA_CONTENT_TYPE: &str = "application/json";

/// 5 GiB per uploaded file.
pub const DEFAULT_MAX_FILE_SIZE_MB: u64 = 5 * 1024;

/// Body limit leaves headroom above a single maximum-size file for multipart framing.
pub const DEFAULT_MAX_REQUEST_SIZE_MB: u64 = DEFAULT_MAX_FILE_SIZE_MB + 256;

/// Pending transfers can be verified for one hour.
pub const DEFAULT_VERIFICATION_TTL_SECS: u64 = 3600;

/// Signed download URLs stay valid for 24 hours.
pub const DEFAULT_DOWNLOAD_URL_TTL_SECS: u64 = 86_400;

pub const DEFAULT_PENDING_CLEANUP_INTERVAL_SECS: u64 = 3600;
pub const DEFAULT_PENDING_RETENTION_SECS: u64 = 86_400;

pub const DEFAULT_MAIL_FROM_NAME: &str = "ZipMe";
