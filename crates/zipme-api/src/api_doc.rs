//! OpenAPI documentation, served at `/api/openapi.json`.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "ZipMe API",
        version = "0.1.0",
        description = "Temporary file sharing. Uploaded files are zipped and held until the sender verifies their email address; the recipient then gets a download link valid for 24 hours."
    ),
    paths(
        handlers::transfers::create_transfer,
        handlers::transfers::get_download_url,
        handlers::transfers::download_redirect,
        handlers::verify::verify_transfer,
        handlers::health::health_check,
        handlers::health::liveness_check,
    ),
    components(
        schemas(
            handlers::transfers::TransferResponse,
            handlers::transfers::DownloadUrlResponse,
            handlers::health::HealthCheckResponse,
            error::ErrorResponse,
        )
    ),
    tags(
        (name = "transfers", description = "Submit files, verify the sender, and retrieve download links"),
        (name = "health", description = "Liveness and storage health checks")
    )
)]
pub struct ApiDoc;
