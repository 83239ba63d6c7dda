use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::{FileId, TransferToken};

/// A single file received with a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub name: String,
    pub data: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
        }
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

/// Raw sender input. Emails stay optional here so that absence is reported by validation.
#[derive(Debug, Clone, Default)]
pub struct Submission {
    pub sender_email: Option<String>,
    pub recipient_email: Option<String>,
    pub files: Vec<UploadedFile>,
}

/// JSON record stored at `pending/{token}/metadata.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferMetadata {
    pub sender_email: String,
    pub recipient_email: String,
    pub created_at: DateTime<Utc>,
}

impl TransferMetadata {
    pub fn new(sender_email: String, recipient_email: String, created_at: DateTime<Utc>) -> Self {
        Self {
            sender_email,
            recipient_email,
            created_at,
        }
    }

    pub fn elapsed(&self, now: DateTime<Utc>) -> Duration {
        now - self.created_at
    }

    /// A transfer is still verifiable while `elapsed <= ttl`.
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        self.elapsed(now) > ttl
    }
}

/// Outcome of a successful verification.
#[derive(Debug, Clone)]
pub struct PromotedTransfer {
    pub token: TransferToken,
    pub file_id: FileId,
    pub recipient_email: String,
    /// False when the delivery email could not be sent after promotion.
    pub recipient_notified: bool,
}

/// Signed URL handed out for a promoted transfer.
#[derive(Debug, Clone, Serialize)]
pub struct DownloadLink {
    pub url: String,
    pub expires_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_json_layout() {
        let created_at = DateTime::parse_from_rfc3339("2026-10-17T08:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let metadata = TransferMetadata::new("a@x.com".into(), "b@x.com".into(), created_at);
        let json = serde_json::to_value(&metadata).unwrap();
        assert_eq!(json["senderEmail"], "a@x.com");
        assert_eq!(json["recipientEmail"], "b@x.com");
        assert_eq!(json["createdAt"], "2026-10-17T08:00:00Z");
    }

    #[test]
    fn test_expiry_boundary_is_inclusive() {
        let now = Utc::now();
        let ttl = Duration::hours(1);
        let at_limit = TransferMetadata::new("a@x.com".into(), "b@x.com".into(), now - ttl);
        assert!(!at_limit.is_expired(now, ttl));

        let past_limit = TransferMetadata::new(
            "a@x.com".into(),
            "b@x.com".into(),
            now - ttl - Duration::seconds(1),
        );
        assert!(past_limit.is_expired(now, ttl));
    }
}
