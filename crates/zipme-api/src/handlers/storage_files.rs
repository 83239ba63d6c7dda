//! Serves local-backend objects behind HMAC-signed, expiring links.

use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use zipme_core::constants::ARCHIVE_CONTENT_TYPE;
use zipme_core::AppError;
use zipme_services::transfer::FILE_NOT_FOUND;
use zipme_storage::{SignatureError, StorageError};

#[derive(Debug, Deserialize)]
pub struct SignedFileQuery {
    pub expires: Option<u64>,
    pub signature: Option<String>,
}

fn signature_rejection(err: SignatureError) -> Response {
    let (status, code, message) = match err {
        SignatureError::Expired => (
            StatusCode::GONE,
            "LINK_EXPIRED",
            "This download link has expired",
        ),
        SignatureError::Malformed | SignatureError::Invalid => (
            StatusCode::FORBIDDEN,
            "INVALID_SIGNATURE",
            "Invalid download link",
        ),
    };
    (status, Json(ErrorResponse::new(message, code))).into_response()
}

#[tracing::instrument(skip(state, query), fields(operation = "serve_signed_file"))]
pub async fn serve_signed_file(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
    Query(query): Query<SignedFileQuery>,
) -> Result<Response, HttpAppError> {
    let Some(signer) = state.url_signer.as_ref() else {
        return Err(AppError::NotFound(FILE_NOT_FOUND.to_string()).into());
    };

    let (Some(expires), Some(signature)) = (query.expires, query.signature.as_deref()) else {
        return Ok(signature_rejection(SignatureError::Malformed));
    };
    if let Err(e) = signer.verify(&key, expires, signature) {
        tracing::debug!(key = %key, error = %e, "Rejected signed storage link");
        return Ok(signature_rejection(e));
    }

    let data = state.storage.download(&key).await.map_err(|e| match e {
        StorageError::NotFound(_) | StorageError::InvalidKey(_) => {
            AppError::NotFound(FILE_NOT_FOUND.to_string())
        }
        other => AppError::Storage(other.to_string()),
    })?;

    let file_name = key.rsplit('/').next().unwrap_or(key.as_str());
    let content_type = if file_name.ends_with(".zip") {
        ARCHIVE_CONTENT_TYPE
    } else {
        "application/octet-stream"
    };

    tracing::info!(key = %key, size_bytes = data.len(), "Serving signed file");

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", file_name),
        )
        .header(header::CACHE_CONTROL, "private, no-store")
        .body(Body::from(data))
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to build response");
            HttpAppError::from(AppError::Internal(e.to_string()))
        })?;

    Ok(response)
}
