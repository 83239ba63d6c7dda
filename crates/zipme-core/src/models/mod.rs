pub mod identifiers;
pub mod transfer;

pub use identifiers::{FileId, TransferToken};
pub use transfer::{DownloadLink, PromotedTransfer, Submission, TransferMetadata, UploadedFile};
