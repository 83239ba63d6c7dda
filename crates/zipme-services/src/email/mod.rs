pub mod notifier;
pub mod templates;

pub use notifier::{create_notifier, LogNotifier, Notifier, NotifyError, SmtpNotifier};
pub use templates::{EmailTemplate, RenderedEmail};
