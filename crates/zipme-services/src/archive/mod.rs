//! Zip bundle creation for submitted files.

mod service;

pub use service::{build_zip_archive, build_zip_archive_blocking, sanitize_file_name};
