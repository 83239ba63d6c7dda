//! Shared key generation for storage backends.
//!
//! These paths are the interoperability contract with existing buckets and must not change.

use zipme_core::constants::{ARCHIVE_FILE_NAME, METADATA_FILE_NAME, PENDING_PREFIX};
use zipme_core::{FileId, TransferToken};

/// Prefix holding every pending transfer: `pending/`.
pub fn pending_root() -> String {
    format!("{}/", PENDING_PREFIX)
}

/// `pending/{token}/`
pub fn pending_prefix(token: &TransferToken) -> String {
    format!("{}/{}/", PENDING_PREFIX, token)
}

/// `pending/{token}/files.zip`
pub fn pending_archive_key(token: &TransferToken) -> String {
    format!("{}/{}/{}", PENDING_PREFIX, token, ARCHIVE_FILE_NAME)
}

/// `pending/{token}/metadata.json`
pub fn pending_metadata_key(token: &TransferToken) -> String {
    format!("{}/{}/{}", PENDING_PREFIX, token, METADATA_FILE_NAME)
}

/// `{file_id}/`
pub fn final_prefix(file_id: &FileId) -> String {
    format!("{}/", file_id)
}

/// `{file_id}/files.zip`
pub fn final_archive_key(file_id: &FileId) -> String {
    format!("{}/{}", file_id, ARCHIVE_FILE_NAME)
}

/// Extract the token segment from any key under `pending/`.
pub fn token_from_pending_key(key: &str) -> Option<TransferToken> {
    let rest = key.strip_prefix(PENDING_PREFIX)?.strip_prefix('/')?;
    let (token, _) = rest.split_once('/')?;
    TransferToken::parse(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        let token = TransferToken::parse("0123456789abcdef0123456789abcdef").unwrap();
        let file_id = FileId::parse("fedcba9876543210fedcba9876543210").unwrap();

        assert_eq!(
            pending_archive_key(&token),
            "pending/0123456789abcdef0123456789abcdef/files.zip"
        );
        assert_eq!(
            pending_metadata_key(&token),
            "pending/0123456789abcdef0123456789abcdef/metadata.json"
        );
        assert_eq!(
            pending_prefix(&token),
            "pending/0123456789abcdef0123456789abcdef/"
        );
        assert_eq!(
            final_archive_key(&file_id),
            "fedcba9876543210fedcba9876543210/files.zip"
        );
        assert_eq!(final_prefix(&file_id), "fedcba9876543210fedcba9876543210/");
        assert_eq!(pending_root(), "pending/");
    }

    #[test]
    fn test_token_from_pending_key() {
        let token = TransferToken::generate();
        assert_eq!(
            token_from_pending_key(&pending_metadata_key(&token)),
            Some(token.clone())
        );
        assert_eq!(token_from_pending_key(&pending_archive_key(&token)), Some(token));
        assert_eq!(token_from_pending_key("pending/not-a-token/files.zip"), None);
        assert_eq!(
            token_from_pending_key("0123456789abcdef0123456789abcdef/files.zip"),
            None
        );
    }
}
