mod service;

pub use service::{TransferService, TransferSettings, FILE_NOT_FOUND, TOKEN_NOT_FOUND};
