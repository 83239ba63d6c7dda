//! Opaque identifiers that double as storage prefixes.
//!
//! Both identifiers are 32 lowercase hex characters (a v4 UUID in simple form). Values
//! arriving from links are parsed before use so nothing else can reach a storage key.

use std::fmt;
use uuid::Uuid;

const IDENTIFIER_LEN: usize = 32;

fn is_identifier(value: &str) -> bool {
    value.len() == IDENTIFIER_LEN
        && value
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

fn generate_identifier() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Identifier of a pending, unverified transfer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransferToken(String);

impl TransferToken {
    pub fn generate() -> Self {
        TransferToken(generate_identifier())
    }

    /// Returns `None` when the value is not a well-formed token.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        is_identifier(value).then(|| TransferToken(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransferToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a promoted, downloadable transfer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileId(String);

impl FileId {
    pub fn generate() -> Self {
        FileId(generate_identifier())
    }

    /// Returns `None` when the value is not a well-formed file id.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        is_identifier(value).then(|| FileId(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_identifiers_parse_back() {
        let token = TransferToken::generate();
        assert_eq!(TransferToken::parse(token.as_str()), Some(token.clone()));

        let file_id = FileId::generate();
        assert_eq!(FileId::parse(file_id.as_str()), Some(file_id));
    }

    #[test]
    fn test_generated_identifiers_are_unique() {
        assert_ne!(TransferToken::generate(), TransferToken::generate());
        assert_ne!(FileId::generate().as_str(), FileId::generate().as_str());
    }

    #[test]
    fn test_rejects_traversal_and_malformed_values() {
        assert!(TransferToken::parse("../../etc/passwd").is_none());
        assert!(TransferToken::parse("").is_none());
        assert!(TransferToken::parse("ABCDEF0123456789ABCDEF0123456789").is_none());
        assert!(FileId::parse("0123456789abcdef0123456789abcde").is_none());
        assert!(FileId::parse("0123456789abcdef0123456789abcdeg").is_none());
        assert!(FileId::parse("pending/0123456789abcdef0123456789").is_none());
    }
}
