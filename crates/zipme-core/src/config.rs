//! Configuration module
//!
//! Settings for the HTTP server, storage backend, email transport, and the transfer
//! workflow limits. Everything is read from the environment (and `.env` via dotenvy).

use std::env;

use crate::constants::{
    DEFAULT_DOWNLOAD_URL_TTL_SECS, DEFAULT_MAIL_FROM_NAME, DEFAULT_MAX_FILE_SIZE_MB,
    DEFAULT_MAX_REQUEST_SIZE_MB, DEFAULT_PENDING_CLEANUP_INTERVAL_SECS,
    DEFAULT_PENDING_RETENTION_SECS, DEFAULT_VERIFICATION_TTL_SECS,
};
use crate::storage_types::StorageBackend;

const SERVER_PORT: u16 = 3000;
const SMTP_PORT: u16 = 587;
const MIN_SIGNING_SECRET_LEN: usize = 32;
const BYTES_PER_MB: u64 = 1024 * 1024;
const DEFAULT_HTTP_CONCURRENCY_LIMIT: usize = 1_024;

/// Upper bound for link lifetimes; S3 presigned URLs cannot outlive 7 days.
pub const MAX_LINK_TTL_SECS: u64 = 7 * 24 * 3600;
/// Upper bound for the reaper interval and retention.
pub const MAX_CLEANUP_SECS: u64 = 365 * 24 * 3600;

fn mb_to_bytes(name: &str, mb: u64) -> Result<u64, anyhow::Error> {
    mb.checked_mul(BYTES_PER_MB)
        .ok_or_else(|| anyhow::anyhow!("{} is too large", name))
}

fn bounded_secs(secs: u64, max: u64) -> chrono::Duration {
    chrono::Duration::seconds(secs.min(max) as i64)
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub environment: String,
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    /// Base of links that point at this API (verification links).
    pub public_base_url: String,
    /// Base of the user-facing pages (post-verification redirect, download page).
    pub frontend_url: String,
    // Storage configuration
    pub storage_backend: StorageBackend,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>,
    pub aws_region: Option<String>,
    pub local_storage_path: String,
    pub local_storage_base_url: String,
    pub storage_signing_secret: Option<String>,
    // Transfer limits
    pub max_file_size_bytes: u64,
    pub max_request_size_bytes: u64,
    pub verification_ttl_secs: u64,
    pub download_url_ttl_secs: u64,
    // Pending transfer reaper
    pub pending_cleanup_enabled: bool,
    pub pending_cleanup_interval_secs: u64,
    pub pending_retention_secs: u64,
    // Email
    pub email_enabled: bool,
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_from: Option<String>,
    pub smtp_tls: bool,
    pub mail_from_name: String,

    /// In-flight request cap for the HTTP server.
    pub http_concurrency_limit: usize,
}

fn parse_or<T: std::str::FromStr>(value: Option<String>, default: T) -> T {
    value
        .and_then(|s| s.trim().parse::<T>().ok())
        .unwrap_or(default)
}

fn parse_bool_or(value: Option<String>, default: bool) -> bool {
    value
        .map(|s| s.trim().to_lowercase())
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key lookup (the process environment in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|s| !s.trim().is_empty());

        let environment = non_empty("ENVIRONMENT")
            .or_else(|| non_empty("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let server_port = match non_empty("PORT") {
            Some(port) => port
                .trim()
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            None => SERVER_PORT,
        };

        let cors_origins = non_empty("CORS_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let public_base_url = non_empty("PUBLIC_BASE_URL")
            .unwrap_or_else(|| format!("http://localhost:{}", server_port))
            .trim_end_matches('/')
            .to_string();
        let frontend_url = non_empty("FRONTEND_URL")
            .map(|s| s.trim_end_matches('/').to_string())
            .unwrap_or_else(|| public_base_url.clone());

        let storage_backend = match non_empty("STORAGE_BACKEND") {
            Some(value) => value.parse()?,
            None => StorageBackend::Local,
        };

        let local_storage_base_url = non_empty("LOCAL_STORAGE_BASE_URL")
            .map(|s| s.trim_end_matches('/').to_string())
            .unwrap_or_else(|| format!("{}/storage", public_base_url));

        let max_file_size_mb = parse_or(lookup("MAX_FILE_SIZE_MB"), DEFAULT_MAX_FILE_SIZE_MB);
        let max_request_size_mb =
            parse_or(lookup("MAX_REQUEST_SIZE_MB"), DEFAULT_MAX_REQUEST_SIZE_MB);

        let config = Config {
            environment,
            server_port,
            cors_origins,
            public_base_url,
            frontend_url,
            storage_backend,
            s3_bucket: non_empty("S3_BUCKET"),
            s3_region: non_empty("S3_REGION"),
            s3_endpoint: non_empty("S3_ENDPOINT"),
            aws_region: non_empty("AWS_REGION"),
            local_storage_path: non_empty("LOCAL_STORAGE_PATH")
                .unwrap_or_else(|| "./data".to_string()),
            local_storage_base_url,
            storage_signing_secret: non_empty("STORAGE_SIGNING_SECRET"),
            max_file_size_bytes: mb_to_bytes("MAX_FILE_SIZE_MB", max_file_size_mb)?,
            max_request_size_bytes: mb_to_bytes("MAX_REQUEST_SIZE_MB", max_request_size_mb)?,
            verification_ttl_secs: parse_or(
                lookup("VERIFICATION_TTL_SECS"),
                DEFAULT_VERIFICATION_TTL_SECS,
            ),
            download_url_ttl_secs: parse_or(
                lookup("DOWNLOAD_URL_TTL_SECS"),
                DEFAULT_DOWNLOAD_URL_TTL_SECS,
            ),
            pending_cleanup_enabled: parse_bool_or(lookup("PENDING_CLEANUP_ENABLED"), false),
            pending_cleanup_interval_secs: parse_or(
                lookup("PENDING_CLEANUP_INTERVAL_SECS"),
                DEFAULT_PENDING_CLEANUP_INTERVAL_SECS,
            ),
            pending_retention_secs: parse_or(
                lookup("PENDING_RETENTION_SECS"),
                DEFAULT_PENDING_RETENTION_SECS,
            ),
            email_enabled: parse_bool_or(lookup("EMAIL_ENABLED"), true),
            smtp_host: non_empty("SMTP_HOST"),
            smtp_port: parse_or(lookup("SMTP_PORT"), SMTP_PORT),
            smtp_user: non_empty("SMTP_USER"),
            smtp_password: non_empty("SMTP_PASSWORD"),
            smtp_from: non_empty("SMTP_FROM"),
            smtp_tls: parse_bool_or(lookup("SMTP_TLS"), true),
            mail_from_name: non_empty("MAIL_FROM_NAME")
                .unwrap_or_else(|| DEFAULT_MAIL_FROM_NAME.to_string()),
            http_concurrency_limit: parse_or(
                lookup("HTTP_CONCURRENCY_LIMIT"),
                DEFAULT_HTTP_CONCURRENCY_LIMIT,
            )
            .max(1),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.is_production() && self.cors_origins.iter().any(|o| o == "*") {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        if self.max_file_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_FILE_SIZE_MB must be greater than 0"));
        }

        if self.max_request_size_bytes < self.max_file_size_bytes {
            return Err(anyhow::anyhow!(
                "MAX_REQUEST_SIZE_MB must be at least MAX_FILE_SIZE_MB"
            ));
        }

        if self.verification_ttl_secs == 0 || self.download_url_ttl_secs == 0 {
            return Err(anyhow::anyhow!(
                "VERIFICATION_TTL_SECS and DOWNLOAD_URL_TTL_SECS must be greater than 0"
            ));
        }

        if self.verification_ttl_secs > MAX_LINK_TTL_SECS
            || self.download_url_ttl_secs > MAX_LINK_TTL_SECS
        {
            return Err(anyhow::anyhow!(
                "VERIFICATION_TTL_SECS and DOWNLOAD_URL_TTL_SECS must not exceed {} seconds",
                MAX_LINK_TTL_SECS
            ));
        }

        if self.pending_cleanup_enabled {
            if self.pending_cleanup_interval_secs == 0
                || self.pending_cleanup_interval_secs > MAX_CLEANUP_SECS
            {
                return Err(anyhow::anyhow!(
                    "PENDING_CLEANUP_INTERVAL_SECS must be between 1 and {}",
                    MAX_CLEANUP_SECS
                ));
            }
            if self.pending_retention_secs > MAX_CLEANUP_SECS {
                return Err(anyhow::anyhow!(
                    "PENDING_RETENTION_SECS must not exceed {}",
                    MAX_CLEANUP_SECS
                ));
            }
            // A pending transfer must stay verifiable for its whole TTL.
            if self.pending_retention_secs < self.verification_ttl_secs {
                return Err(anyhow::anyhow!(
                    "PENDING_RETENTION_SECS ({}) must be at least VERIFICATION_TTL_SECS ({})",
                    self.pending_retention_secs,
                    self.verification_ttl_secs
                ));
            }
        }

        match self.storage_backend {
            StorageBackend::S3 => {
                if self.s3_bucket.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_BUCKET must be set when using S3 storage backend"
                    ));
                }
                if self.s3_region.is_none() && self.aws_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                    ));
                }
            }
            StorageBackend::Local => match self.storage_signing_secret.as_deref() {
                None => {
                    return Err(anyhow::anyhow!(
                        "STORAGE_SIGNING_SECRET must be set when using local storage backend"
                    ))
                }
                Some(secret) if secret.len() < MIN_SIGNING_SECRET_LEN => {
                    return Err(anyhow::anyhow!(
                        "STORAGE_SIGNING_SECRET must be at least {} characters long",
                        MIN_SIGNING_SECRET_LEN
                    ))
                }
                Some(_) => {}
            },
        }

        if self.email_enabled && (self.smtp_host.is_none() || self.smtp_from.is_none()) {
            return Err(anyhow::anyhow!(
                "EMAIL_ENABLED=true requires SMTP_HOST and SMTP_FROM to be set"
            ));
        }

        Ok(())
    }

    /// How long a pending transfer can be verified.
    pub fn verification_ttl(&self) -> chrono::Duration {
        bounded_secs(self.verification_ttl_secs, MAX_LINK_TTL_SECS)
    }

    /// Age past which the reaper removes a pending transfer. Never shorter than the
    /// verification TTL.
    pub fn pending_retention(&self) -> chrono::Duration {
        bounded_secs(self.pending_retention_secs, MAX_CLEANUP_SECS).max(self.verification_ttl())
    }

    /// S3 region, falling back to the generic AWS region.
    pub fn effective_s3_region(&self) -> Option<&str> {
        self.s3_region.as_deref().or(self.aws_region.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_for_local_development() {
        let config = Config::from_lookup(lookup(&[
            ("STORAGE_SIGNING_SECRET", SECRET),
            ("EMAIL_ENABLED", "false"),
        ]))
        .unwrap();

        assert_eq!(config.server_port, 3000);
        assert_eq!(config.storage_backend, StorageBackend::Local);
        assert_eq!(config.public_base_url, "http://localhost:3000");
        assert_eq!(config.frontend_url, "http://localhost:3000");
        assert_eq!(config.local_storage_base_url, "http://localhost:3000/storage");
        assert_eq!(config.max_file_size_bytes, 5 * 1024 * 1024 * 1024);
        assert_eq!(config.verification_ttl_secs, 3600);
        assert_eq!(config.download_url_ttl_secs, 86_400);
        assert!(!config.pending_cleanup_enabled);
        assert!(!config.is_production());
    }

    #[test]
    fn test_trailing_slashes_are_trimmed() {
        let config = Config::from_lookup(lookup(&[
            ("STORAGE_SIGNING_SECRET", SECRET),
            ("EMAIL_ENABLED", "false"),
            ("PUBLIC_BASE_URL", "https://api.zipme.test/"),
            ("FRONTEND_URL", "https://zipme.test/"),
        ]))
        .unwrap();
        assert_eq!(config.public_base_url, "https://api.zipme.test");
        assert_eq!(config.frontend_url, "https://zipme.test");
        assert_eq!(config.local_storage_base_url, "https://api.zipme.test/storage");
    }

    #[test]
    fn test_local_backend_requires_signing_secret() {
        let err = Config::from_lookup(lookup(&[("EMAIL_ENABLED", "false")])).unwrap_err();
        assert!(err.to_string().contains("STORAGE_SIGNING_SECRET"));

        let err = Config::from_lookup(lookup(&[
            ("EMAIL_ENABLED", "false"),
            ("STORAGE_SIGNING_SECRET", "short"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("at least"));
    }

    #[test]
    fn test_s3_backend_requires_bucket_and_region() {
        let err = Config::from_lookup(lookup(&[
            ("EMAIL_ENABLED", "false"),
            ("STORAGE_BACKEND", "s3"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("S3_BUCKET"));

        let config = Config::from_lookup(lookup(&[
            ("EMAIL_ENABLED", "false"),
            ("STORAGE_BACKEND", "s3"),
            ("S3_BUCKET", "files"),
            ("AWS_REGION", "eu-west-3"),
        ]))
        .unwrap();
        assert_eq!(config.effective_s3_region(), Some("eu-west-3"));
    }

    #[test]
    fn test_email_enabled_requires_smtp() {
        let err = Config::from_lookup(lookup(&[("STORAGE_SIGNING_SECRET", SECRET)])).unwrap_err();
        assert!(err.to_string().contains("SMTP_HOST"));
    }

    #[test]
    fn test_production_rejects_wildcard_cors() {
        let err = Config::from_lookup(lookup(&[
            ("ENVIRONMENT", "production"),
            ("STORAGE_SIGNING_SECRET", SECRET),
            ("EMAIL_ENABLED", "false"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("CORS_ORIGINS"));
    }

    #[test]
    fn test_cleanup_interval_must_be_positive() {
        let err = Config::from_lookup(lookup(&[
            ("STORAGE_SIGNING_SECRET", SECRET),
            ("EMAIL_ENABLED", "false"),
            ("PENDING_CLEANUP_ENABLED", "true"),
            ("PENDING_CLEANUP_INTERVAL_SECS", "0"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("PENDING_CLEANUP_INTERVAL_SECS"));

        // Ignored while the reaper is off.
        assert!(Config::from_lookup(lookup(&[
            ("STORAGE_SIGNING_SECRET", SECRET),
            ("EMAIL_ENABLED", "false"),
            ("PENDING_CLEANUP_INTERVAL_SECS", "0"),
        ]))
        .is_ok());
    }

    #[test]
    fn test_retention_cannot_undercut_verification_ttl() {
        let err = Config::from_lookup(lookup(&[
            ("STORAGE_SIGNING_SECRET", SECRET),
            ("EMAIL_ENABLED", "false"),
            ("PENDING_CLEANUP_ENABLED", "true"),
            ("PENDING_RETENTION_SECS", "60"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("PENDING_RETENTION_SECS"));

        let config = Config::from_lookup(lookup(&[
            ("STORAGE_SIGNING_SECRET", SECRET),
            ("EMAIL_ENABLED", "false"),
            ("PENDING_CLEANUP_ENABLED", "true"),
            ("PENDING_RETENTION_SECS", "3600"),
        ]))
        .unwrap();
        assert_eq!(config.pending_retention(), chrono::Duration::hours(1));
    }

    #[test]
    fn test_pending_retention_never_below_verification_ttl() {
        let mut config = Config::from_lookup(lookup(&[
            ("STORAGE_SIGNING_SECRET", SECRET),
            ("EMAIL_ENABLED", "false"),
        ]))
        .unwrap();
        config.pending_retention_secs = 60;
        assert_eq!(config.pending_retention(), chrono::Duration::hours(1));
    }

    #[test]
    fn test_oversized_values_are_rejected() {
        let huge = u64::MAX.to_string();
        let err = Config::from_lookup(lookup(&[
            ("STORAGE_SIGNING_SECRET", SECRET),
            ("EMAIL_ENABLED", "false"),
            ("MAX_FILE_SIZE_MB", huge.as_str()),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("MAX_FILE_SIZE_MB"));

        let err = Config::from_lookup(lookup(&[
            ("STORAGE_SIGNING_SECRET", SECRET),
            ("EMAIL_ENABLED", "false"),
            ("VERIFICATION_TTL_SECS", huge.as_str()),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("VERIFICATION_TTL_SECS"));
    }

    #[test]
    fn test_http_concurrency_limit() {
        let config = Config::from_lookup(lookup(&[
            ("STORAGE_SIGNING_SECRET", SECRET),
            ("EMAIL_ENABLED", "false"),
        ]))
        .unwrap();
        assert_eq!(config.http_concurrency_limit, 1_024);

        let config = Config::from_lookup(lookup(&[
            ("STORAGE_SIGNING_SECRET", SECRET),
            ("EMAIL_ENABLED", "false"),
            ("HTTP_CONCURRENCY_LIMIT", "0"),
        ]))
        .unwrap();
        assert_eq!(config.http_concurrency_limit, 1);
    }

    #[test]
    fn test_invalid_port() {
        let err = Config::from_lookup(lookup(&[("PORT", "http")])).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }
}
