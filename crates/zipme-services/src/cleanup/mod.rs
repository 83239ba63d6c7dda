mod service;

pub use service::{CleanupReport, PendingCleanupService};
