//! Submission validation
//!
//! Runs before any archive is built or storage is touched; the first violation wins.

use validator::ValidateEmail;

use crate::error::AppError;
use crate::models::UploadedFile;

const GIB: u64 = 1024 * 1024 * 1024;
const MIB: u64 = 1024 * 1024;

/// Human-readable size limit, e.g. `5GB` or `500MB`.
pub fn format_size_limit(bytes: u64) -> String {
    if bytes >= GIB && bytes % GIB == 0 {
        format!("{}GB", bytes / GIB)
    } else if bytes >= MIB && bytes % MIB == 0 {
        format!("{}MB", bytes / MIB)
    } else {
        format!("{} bytes", bytes)
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Validate a submission.
///
/// Fails with `AppError::Validation` when an email is missing or malformed, when no file
/// was sent, or when a file is larger than `max_file_size_bytes`.
pub fn validate_submission(
    sender_email: Option<&str>,
    recipient_email: Option<&str>,
    files: &[UploadedFile],
    max_file_size_bytes: u64,
) -> Result<(), AppError> {
    let (Some(sender), Some(recipient)) = (present(sender_email), present(recipient_email))
    else {
        return Err(AppError::Validation("All fields are required".to_string()));
    };
    if files.is_empty() {
        return Err(AppError::Validation("All fields are required".to_string()));
    }

    if !sender.validate_email() {
        return Err(AppError::Validation(format!(
            "Invalid sender email address: {}",
            sender
        )));
    }
    if !recipient.validate_email() {
        return Err(AppError::Validation(format!(
            "Invalid recipient email address: {}",
            recipient
        )));
    }

    if let Some(file) = files.iter().find(|f| f.size() > max_file_size_bytes) {
        return Err(AppError::Validation(format!(
            "The file {} exceeds the maximum size of {}",
            file.name,
            format_size_limit(max_file_size_bytes)
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIMIT: u64 = 5 * GIB;

    fn report() -> Vec<UploadedFile> {
        vec![UploadedFile::new("report.pdf", vec![0u8; 10])]
    }

    fn message(result: Result<(), AppError>) -> String {
        match result {
            Err(AppError::Validation(msg)) => msg,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_valid_submission() {
        assert!(validate_submission(Some("a@x.com"), Some("b@x.com"), &report(), LIMIT).is_ok());
    }

    #[test]
    fn test_missing_fields() {
        assert_eq!(
            message(validate_submission(None, Some("b@x.com"), &report(), LIMIT)),
            "All fields are required"
        );
        assert_eq!(
            message(validate_submission(Some("a@x.com"), Some("   "), &report(), LIMIT)),
            "All fields are required"
        );
        assert_eq!(
            message(validate_submission(Some("a@x.com"), Some("b@x.com"), &[], LIMIT)),
            "All fields are required"
        );
    }

    #[test]
    fn test_malformed_email() {
        let msg = message(validate_submission(
            Some("not-an-email"),
            Some("b@x.com"),
            &report(),
            LIMIT,
        ));
        assert!(msg.contains("sender"));
    }

    #[test]
    fn test_oversized_file_reports_first_offender() {
        let files = vec![
            UploadedFile::new("ok.txt", vec![0u8; 4]),
            UploadedFile::new("big.bin", vec![0u8; 17]),
            UploadedFile::new("bigger.bin", vec![0u8; 32]),
        ];
        let msg = message(validate_submission(
            Some("a@x.com"),
            Some("b@x.com"),
            &files,
            16,
        ));
        assert!(msg.contains("big.bin"));
        assert!(!msg.contains("bigger.bin"));
    }

    #[test]
    fn test_file_at_limit_is_accepted() {
        let files = vec![UploadedFile::new("exact.bin", vec![0u8; 16])];
        assert!(validate_submission(Some("a@x.com"), Some("b@x.com"), &files, 16).is_ok());
    }

    #[test]
    fn test_format_size_limit() {
        assert_eq!(format_size_limit(5 * GIB), "5GB");
        assert_eq!(format_size_limit(500 * MIB), "500MB");
        assert_eq!(format_size_limit(16), "16 bytes");
    }
}
