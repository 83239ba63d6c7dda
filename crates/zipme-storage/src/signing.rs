//! Signed URLs for backends that have no native presigning.
//!
//! URL format: `{base_url}/{key}?expires={unix_ts}&signature={hex}` where
//! `signature = HMAC-SHA256(secret, "{key}\n{unix_ts}")`.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("Malformed signature")]
    Malformed,

    #[error("Invalid signature")]
    Invalid,

    #[error("Signed URL has expired")]
    Expired,
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// HMAC signer shared by `LocalStorage` and the route that serves its files.
#[derive(Clone)]
pub struct UrlSigner {
    secret: Arc<[u8]>,
}

impl std::fmt::Debug for UrlSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UrlSigner").finish_non_exhaustive()
    }
}

impl UrlSigner {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            secret: Arc::from(secret.as_ref()),
        }
    }

    fn mac(&self, key: &str, expires: u64) -> HmacSha256 {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).expect("HMAC accepts any key size");
        mac.update(key.as_bytes());
        mac.update(b"\n");
        mac.update(expires.to_string().as_bytes());
        mac
    }

    /// Hex signature for `key` valid until `expires` (unix seconds).
    pub fn signature(&self, key: &str, expires: u64) -> String {
        hex::encode(self.mac(key, expires).finalize().into_bytes())
    }

    /// Build a signed URL for `key` below `base_url`; returns the URL and its expiry.
    pub fn sign_url(&self, base_url: &str, key: &str, expires_in: Duration) -> (String, u64) {
        let expires = unix_now().saturating_add(expires_in.as_secs());
        let encoded_key = key
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");
        let url = format!(
            "{}/{}?expires={}&signature={}",
            base_url.trim_end_matches('/'),
            encoded_key,
            expires,
            self.signature(key, expires)
        );
        (url, expires)
    }

    /// Verify a signature against the current time.
    pub fn verify(&self, key: &str, expires: u64, signature: &str) -> Result<(), SignatureError> {
        self.verify_at(key, expires, signature, unix_now())
    }

    pub fn verify_at(
        &self,
        key: &str,
        expires: u64,
        signature: &str,
        now: u64,
    ) -> Result<(), SignatureError> {
        let tag = hex::decode(signature).map_err(|_| SignatureError::Malformed)?;
        self.mac(key, expires)
            .verify_slice(&tag)
            .map_err(|_| SignatureError::Invalid)?;
        if now > expires {
            return Err(SignatureError::Expired);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "fedcba9876543210fedcba9876543210/files.zip";

    fn signer() -> UrlSigner {
        UrlSigner::new("0123456789abcdef0123456789abcdef")
    }

    #[test]
    fn test_sign_url_shape_and_expiry() {
        let before = unix_now();
        let (url, expires) =
            signer().sign_url("http://localhost:3000/storage/", KEY, Duration::from_secs(86_400));

        assert!(expires >= before + 86_400 && expires <= unix_now() + 86_400);
        assert!(url.starts_with(&format!("http://localhost:3000/storage/{}?expires=", KEY)));
        let signature = url.rsplit("signature=").next().unwrap();
        assert!(signer().verify(KEY, expires, signature).is_ok());
    }

    #[test]
    fn test_tampered_inputs_are_rejected() {
        let expires = unix_now() + 60;
        let signature = signer().signature(KEY, expires);

        assert_eq!(
            signer().verify("0123456789abcdef0123456789abcdef/files.zip", expires, &signature),
            Err(SignatureError::Invalid)
        );
        assert_eq!(
            signer().verify(KEY, expires + 3600, &signature),
            Err(SignatureError::Invalid)
        );
        assert_eq!(
            UrlSigner::new("another-secret-another-secret-xx").verify(KEY, expires, &signature),
            Err(SignatureError::Invalid)
        );
        assert_eq!(
            signer().verify(KEY, expires, "not-hex"),
            Err(SignatureError::Malformed)
        );
    }

    #[test]
    fn test_expired_signature() {
        let signature = signer().signature(KEY, 1_000);
        assert!(signer().verify_at(KEY, 1_000, &signature, 1_000).is_ok());
        assert_eq!(
            signer().verify_at(KEY, 1_000, &signature, 1_001),
            Err(SignatureError::Expired)
        );
    }
}
