//! Test helpers: a router over temp-dir local storage with a recording notifier.

#![allow(dead_code)]

use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tempfile::TempDir;
use zipme_api::setup::routes::setup_routes;
use zipme_api::AppState;
use zipme_core::{Config, TransferMetadata, TransferToken};
use zipme_services::test_helpers::RecordingNotifier;
use zipme_storage::{create_storage, create_url_signer, keys, Storage};

pub const SENDER: &str = "a@x.com";
pub const RECIPIENT: &str = "b@x.com";
pub const PUBLIC_BASE_URL: &str = "http://localhost:3000";
pub const FRONTEND_URL: &str = "http://localhost:8080";
pub const SIGNING_SECRET: &str = "0123456789abcdef0123456789abcdef";

pub struct TestApp {
    pub server: TestServer,
    pub notifier: Arc<RecordingNotifier>,
    pub storage: Arc<dyn Storage>,
    pub config: Config,
    _temp_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    /// Token carried by the latest verification email to `sender`.
    pub fn verification_token(&self, sender: &str) -> String {
        self.notifier
            .link_param(sender, "token")
            .expect("verification email with token")
    }

    /// Stage a transfer directly in storage, bypassing the HTTP surface.
    pub async fn stage_pending(&self, created_at: DateTime<Utc>) -> TransferToken {
        let token = TransferToken::generate();
        let metadata = TransferMetadata::new(SENDER.into(), RECIPIENT.into(), created_at);
        self.storage
            .upload(
                &keys::pending_archive_key(&token),
                bytes::Bytes::from_static(b"PK\x05\x06"),
                "application/zip",
                true,
            )
            .await
            .unwrap();
        self.storage
            .upload(
                &keys::pending_metadata_key(&token),
                bytes::Bytes::from(serde_json::to_vec(&metadata).unwrap()),
                "application/json",
                true,
            )
            .await
            .unwrap();
        token
    }
}

fn test_config(storage_path: &str, overrides: &[(&str, &str)]) -> Config {
    let mut pairs: Vec<(String, String)> = [
        ("LOCAL_STORAGE_PATH", storage_path),
        ("STORAGE_SIGNING_SECRET", SIGNING_SECRET),
        ("EMAIL_ENABLED", "false"),
        ("PUBLIC_BASE_URL", PUBLIC_BASE_URL),
        ("FRONTEND_URL", FRONTEND_URL),
        ("MAX_FILE_SIZE_MB", "1"),
        ("MAX_REQUEST_SIZE_MB", "4"),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    // Later entries win.
    pairs.extend(overrides.iter().map(|(k, v)| (k.to_string(), v.to_string())));

    Config::from_lookup(move |key| {
        pairs
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    })
    .expect("valid test config")
}

pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(RecordingNotifier::new()).await
}

pub async fn setup_test_app_with(notifier: RecordingNotifier) -> TestApp {
    setup_test_app_with_env(notifier, &[]).await
}

/// Test app with extra environment entries layered over the defaults.
pub async fn setup_test_app_with_env(
    notifier: RecordingNotifier,
    overrides: &[(&str, &str)],
) -> TestApp {
    let temp_dir = tempfile::tempdir().expect("temp dir");
    let config = test_config(
        temp_dir.path().to_str().expect("utf-8 temp path"),
        overrides,
    );

    let storage = create_storage(&config).await.expect("local storage");
    let signer = create_url_signer(&config).expect("url signer");
    let notifier = Arc::new(notifier);

    let state = Arc::new(AppState::new(
        config.clone(),
        storage.clone(),
        notifier.clone(),
        Some(signer),
    ));
    let router = setup_routes(&config, state).expect("router");
    let server = TestServer::new(router).expect("test server");

    TestApp {
        server,
        notifier,
        storage,
        config,
        _temp_dir: temp_dir,
    }
}

/// Submission form with both emails and one file per `(name, bytes)` pair.
pub fn transfer_form(sender: &str, recipient: &str, files: &[(&str, &[u8])]) -> MultipartForm {
    let mut form = MultipartForm::new()
        .add_text("senderEmail", sender.to_string())
        .add_text("recipientEmail", recipient.to_string());
    for (name, data) in files {
        let part = Part::bytes(data.to_vec())
            .file_name(name.to_string())
            .mime_type("application/octet-stream");
        form = form.add_part("uploadedFiles", part);
    }
    form
}

/// Path and query of an absolute URL served by the test app.
pub fn local_path(url: &str) -> String {
    url.strip_prefix(PUBLIC_BASE_URL)
        .expect("URL served by this app")
        .to_string()
}

/// Value of query parameter `name` in a redirect location.
pub fn query_param(location: &str, name: &str) -> Option<String> {
    let (_, query) = location.split_once('?')?;
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| urlencoding::decode(value).map(|v| v.into_owned()).unwrap_or_default())
}
