//! Email delivery over SMTP, with a logging fallback for development.

use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::sync::Arc;
use thiserror::Error;
use zipme_core::Config;

use super::templates::EmailTemplate;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Invalid email address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("Failed to build email: {0}")]
    Build(String),

    #[error("SMTP transport error: {0}")]
    Transport(String),

    #[error("Email configuration error: {0}")]
    Config(String),
}

/// Sends a templated transactional email.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, to: &str, subject: &str, template: &EmailTemplate)
        -> Result<(), NotifyError>;
}

fn parse_address(address: &str) -> Result<Address, NotifyError> {
    address
        .trim()
        .parse()
        .map_err(|e: lettre::address::AddressError| NotifyError::InvalidAddress {
            address: address.to_string(),
            reason: e.to_string(),
        })
}

/// SMTP notifier backed by lettre.
#[derive(Clone)]
pub struct SmtpNotifier {
    mailer: Arc<AsyncSmtpTransport<Tokio1Executor>>,
    from: Mailbox,
}

impl SmtpNotifier {
    pub fn from_config(config: &Config) -> Result<Self, NotifyError> {
        let host = config
            .smtp_host
            .as_deref()
            .ok_or_else(|| NotifyError::Config("SMTP_HOST not configured".to_string()))?;
        let from_address = config
            .smtp_from
            .as_deref()
            .ok_or_else(|| NotifyError::Config("SMTP_FROM not configured".to_string()))?;
        let from = Mailbox::new(
            Some(config.mail_from_name.clone()),
            parse_address(from_address)?,
        );
        let port = config.smtp_port;
        let credentials = match (&config.smtp_user, &config.smtp_password) {
            (Some(user), Some(password)) => Some(Credentials::new(user.clone(), password.clone())),
            _ => None,
        };

        let mailer = if config.smtp_tls {
            let builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                .map_err(|e| NotifyError::Config(e.to_string()))?
                .port(port);
            let builder = match credentials {
                Some(c) => builder.credentials(c),
                None => builder,
            };
            tracing::info!(host = %host, port = port, "Email service initialized (SMTP with STARTTLS)");
            builder.build()
        } else {
            let builder = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host).port(port);
            let builder = match credentials {
                Some(c) => builder.credentials(c),
                None => builder,
            };
            tracing::info!(host = %host, port = port, "Email service initialized (SMTP)");
            builder.build()
        };

        Ok(Self {
            mailer: Arc::new(mailer),
            from,
        })
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(
        &self,
        to: &str,
        subject: &str,
        template: &EmailTemplate,
    ) -> Result<(), NotifyError> {
        let to_mailbox = Mailbox::new(None, parse_address(to)?);
        let rendered = template.render();

        let email = Message::builder()
            .from(self.from.clone())
            .to(to_mailbox)
            .subject(subject)
            .multipart(MultiPart::alternative_plain_html(rendered.text, rendered.html))
            .map_err(|e| NotifyError::Build(e.to_string()))?;

        let start = std::time::Instant::now();
        self.mailer
            .send(email)
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        tracing::info!(
            template = template.name(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Email sent"
        );
        tracing::debug!(to = %to, subject = %subject, "Email recipient");
        Ok(())
    }
}

/// Writes emails to the log instead of sending them.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(
        &self,
        to: &str,
        subject: &str,
        template: &EmailTemplate,
    ) -> Result<(), NotifyError> {
        parse_address(to)?;
        let rendered = template.render();
        tracing::info!(
            template = template.name(),
            subject = %subject,
            body = %rendered.text,
            "Email delivery disabled, logging message"
        );
        tracing::debug!(to = %to, "Email recipient");
        Ok(())
    }
}

/// SMTP notifier when email is enabled, logging notifier otherwise.
pub fn create_notifier(config: &Config) -> Result<Arc<dyn Notifier>, NotifyError> {
    if !config.email_enabled {
        tracing::warn!("Email delivery disabled (EMAIL_ENABLED=false); emails will be logged");
        return Ok(Arc::new(LogNotifier));
    }
    Ok(Arc::new(SmtpNotifier::from_config(config)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(pairs: &[(&str, &str)]) -> Config {
        let pairs: Vec<(String, String)> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(move |key| {
            pairs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
        })
        .unwrap()
    }

    const SECRET: (&str, &str) = ("STORAGE_SIGNING_SECRET", "0123456789abcdef0123456789abcdef");

    #[tokio::test]
    async fn test_log_notifier_rejects_invalid_address() {
        let template = EmailTemplate::VerifyEmail {
            verify_url: "http://localhost/api/verify?token=x".to_string(),
        };
        assert!(LogNotifier.send("a@x.com", "Verify", &template).await.is_ok());
        assert!(matches!(
            LogNotifier.send("not an address", "Verify", &template).await,
            Err(NotifyError::InvalidAddress { .. })
        ));
    }

    #[tokio::test]
    async fn test_smtp_notifier_from_config() {
        let cfg = config(&[
            SECRET,
            ("SMTP_HOST", "localhost"),
            ("SMTP_FROM", "noreply@zipme.test"),
            ("SMTP_TLS", "false"),
            ("SMTP_PORT", "2525"),
        ]);
        let notifier = SmtpNotifier::from_config(&cfg).unwrap();
        assert_eq!(notifier.from.to_string(), "ZipMe <noreply@zipme.test>");
    }

    #[tokio::test]
    async fn test_invalid_from_address_is_rejected() {
        let cfg = config(&[
            SECRET,
            ("SMTP_HOST", "localhost"),
            ("SMTP_FROM", "not-an-address"),
            ("SMTP_TLS", "false"),
        ]);
        assert!(matches!(
            SmtpNotifier::from_config(&cfg),
            Err(NotifyError::InvalidAddress { .. })
        ));
    }

    #[test]
    fn test_disabled_email_uses_log_notifier() {
        let cfg = config(&[SECRET, ("EMAIL_ENABLED", "false")]);
        assert!(create_notifier(&cfg).is_ok());
    }
}
