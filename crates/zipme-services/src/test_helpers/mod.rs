//! Test doubles for the notifier and storage seams.

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use zipme_storage::{ObjectEntry, Storage, StorageBackend, StorageError, StorageResult};

use crate::email::{EmailTemplate, Notifier, NotifyError};

/// One attempted delivery.
#[derive(Debug, Clone)]
pub struct SentEmail {
    pub to: String,
    pub subject: String,
    pub template: EmailTemplate,
    pub delivered: bool,
}

/// Notifier that records every email and can be told to fail for some templates.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<SentEmail>>,
    fail_templates: Vec<&'static str>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every email whose template name (`send-file`, `verify-email`) is listed.
    pub fn failing_on(templates: &[&'static str]) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail_templates: templates.to_vec(),
        }
    }

    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Delivered emails addressed to `to`.
    pub fn delivered_to(&self, to: &str) -> Vec<SentEmail> {
        self.sent()
            .into_iter()
            .filter(|e| e.delivered && e.to == to)
            .collect()
    }

    /// Query parameter `name` of the link carried by the most recent delivered email to `to`.
    pub fn link_param(&self, to: &str, name: &str) -> Option<String> {
        let email = self.delivered_to(to).pop()?;
        let url = match &email.template {
            EmailTemplate::SendFile { url, .. } => url.clone(),
            EmailTemplate::VerifyEmail { verify_url } => verify_url.clone(),
        };
        let (_, query) = url.split_once('?')?;
        query
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.to_string())
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(
        &self,
        to: &str,
        subject: &str,
        template: &EmailTemplate,
    ) -> Result<(), NotifyError> {
        let delivered = !self.fail_templates.contains(&template.name());
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(SentEmail {
                to: to.to_string(),
                subject: subject.to_string(),
                template: template.clone(),
                delivered,
            });
        }
        if delivered {
            Ok(())
        } else {
            Err(NotifyError::Transport("simulated SMTP failure".to_string()))
        }
    }
}

/// Storage wrapper that injects failures into selected operations.
pub struct FailingStorage {
    inner: Arc<dyn Storage>,
    fail_upload_suffix: Option<String>,
    fail_move: bool,
    fail_list: bool,
}

impl FailingStorage {
    pub fn new(inner: Arc<dyn Storage>) -> Self {
        Self {
            inner,
            fail_upload_suffix: None,
            fail_move: false,
            fail_list: false,
        }
    }

    /// Fail uploads whose key ends with `suffix`.
    pub fn fail_uploads_ending_with(mut self, suffix: &str) -> Self {
        self.fail_upload_suffix = Some(suffix.to_string());
        self
    }

    pub fn fail_moves(mut self) -> Self {
        self.fail_move = true;
        self
    }

    pub fn fail_lists(mut self) -> Self {
        self.fail_list = true;
        self
    }
}

#[async_trait]
impl Storage for FailingStorage {
    async fn upload(
        &self,
        key: &str,
        data: Bytes,
        content_type: &str,
        upsert: bool,
    ) -> StorageResult<()> {
        if let Some(suffix) = &self.fail_upload_suffix {
            if key.ends_with(suffix.as_str()) {
                return Err(StorageError::UploadFailed(format!("simulated failure for {}", key)));
            }
        }
        self.inner.upload(key, data, content_type, upsert).await
    }

    async fn download(&self, key: &str) -> StorageResult<Vec<u8>> {
        self.inner.download(key).await
    }

    async fn list(&self, prefix: &str) -> StorageResult<Vec<ObjectEntry>> {
        if self.fail_list {
            return Err(StorageError::BackendError("simulated list failure".to_string()));
        }
        self.inner.list(prefix).await
    }

    async fn move_object(&self, from_key: &str, to_key: &str) -> StorageResult<()> {
        if self.fail_move {
            return Err(StorageError::MoveFailed(format!(
                "simulated failure moving {} to {}",
                from_key, to_key
            )));
        }
        self.inner.move_object(from_key, to_key).await
    }

    async fn remove(&self, keys: &[String]) -> StorageResult<Vec<String>> {
        self.inner.remove(keys).await
    }

    async fn signed_url(&self, key: &str, expires_in: Duration) -> StorageResult<String> {
        self.inner.signed_url(key, expires_in).await
    }

    fn backend_type(&self) -> StorageBackend {
        self.inner.backend_type()
    }
}
