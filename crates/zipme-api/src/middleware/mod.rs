pub mod error_details;
pub mod request_id;

pub use error_details::{error_details_middleware, ErrorDetailPolicy};
pub use request_id::{request_id_middleware, RequestId, REQUEST_ID_HEADER};
