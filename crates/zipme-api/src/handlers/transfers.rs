//! Transfer submission and retrieval.

use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    extract::{Multipart, Path, State},
    response::Redirect,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use zipme_core::{Submission, UploadedFile};

const SENDER_FIELD: &str = "senderEmail";
const RECIPIENT_FIELD: &str = "recipientEmail";
const FILES_FIELD: &str = "uploadedFiles";

#[derive(Debug, Serialize, ToSchema)]
pub struct TransferResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DownloadUrlResponse {
    pub success: bool,
    pub url: String,
    pub expires_at: DateTime<Utc>,
}

/// Read the submission form. Unknown fields are skipped; an empty file part (no file
/// chosen in the browser form) is ignored.
async fn read_submission(mut multipart: Multipart) -> Result<Submission, HttpAppError> {
    let mut submission = Submission::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            SENDER_FIELD => submission.sender_email = Some(field.text().await?),
            RECIPIENT_FIELD => submission.recipient_email = Some(field.text().await?),
            FILES_FIELD => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let data = field.bytes().await?;
                if file_name.is_empty() && data.is_empty() {
                    continue;
                }
                tracing::debug!(file_name = %file_name, size_bytes = data.len(), "Received file part");
                submission.files.push(UploadedFile::new(file_name, data.to_vec()));
            }
            other => tracing::debug!(field = %other, "Ignoring unknown multipart field"),
        }
    }

    Ok(submission)
}

#[utoipa::path(
    post,
    path = "/api/transfers",
    tag = "transfers",
    request_body(content = inline(Object), content_type = "multipart/form-data",
        description = "Fields `senderEmail`, `recipientEmail` and one or more `uploadedFiles` parts"),
    responses(
        (status = 200, description = "Files staged, verification email sent to the sender", body = TransferResponse),
        (status = 400, description = "Missing field or file too large", body = ErrorResponse),
        (status = 413, description = "Request body too large", body = ErrorResponse),
        (status = 500, description = "Files could not be stored", body = ErrorResponse),
        (status = 502, description = "Verification email could not be sent", body = ErrorResponse)
    )
)]
pub async fn create_transfer(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<TransferResponse>, HttpAppError> {
    let submission = read_submission(multipart).await?;
    state.transfers.submit(submission).await?;

    Ok(Json(TransferResponse {
        success: true,
        message: "Check your inbox to verify your email and send the files".to_string(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/transfers/{file_id}/download-url",
    tag = "transfers",
    params(("file_id" = String, Path, description = "Identifier from the recipient's email link")),
    responses(
        (status = 200, description = "Signed download URL, valid for 24 hours", body = DownloadUrlResponse),
        (status = 404, description = "File not found or expired", body = ErrorResponse)
    )
)]
pub async fn get_download_url(
    State(state): State<Arc<AppState>>,
    Path(file_id): Path<String>,
) -> Result<Json<DownloadUrlResponse>, HttpAppError> {
    let link = state.transfers.download_url(&file_id).await?;

    Ok(Json(DownloadUrlResponse {
        success: true,
        url: link.url,
        expires_at: link.expires_at,
    }))
}

#[utoipa::path(
    get,
    path = "/download/{file_id}",
    tag = "transfers",
    params(("file_id" = String, Path, description = "Identifier from the recipient's email link")),
    responses(
        (status = 303, description = "Redirect to a fresh signed download URL"),
        (status = 404, description = "File not found or expired", body = ErrorResponse)
    )
)]
pub async fn download_redirect(
    State(state): State<Arc<AppState>>,
    Path(file_id): Path<String>,
) -> Result<Redirect, HttpAppError> {
    let link = state.transfers.download_url(&file_id).await?;
    Ok(Redirect::to(&link.url))
}
