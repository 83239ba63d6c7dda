//! Adds `details` and `error_type` to JSON error bodies outside production.

use crate::error::ErrorDetail;
use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use zipme_core::Config;

/// Error bodies are small; anything larger is passed through untouched.
const MAX_ERROR_BODY_BYTES: usize = 64 * 1024;

#[derive(Debug, Clone, Copy)]
pub struct ErrorDetailPolicy {
    pub expose_details: bool,
}

impl ErrorDetailPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            expose_details: !config.is_production(),
        }
    }
}

fn merge_detail(body: &[u8], detail: ErrorDetail) -> Option<Vec<u8>> {
    let mut value: serde_json::Value = serde_json::from_slice(body).ok()?;
    let object = value.as_object_mut()?;
    object.insert("details".to_string(), detail.details.into());
    object.insert("error_type".to_string(), detail.error_type.into());
    serde_json::to_vec(&value).ok()
}

pub async fn error_details_middleware(
    State(policy): State<ErrorDetailPolicy>,
    request: Request,
    next: Next,
) -> Response {
    let response = next.run(request).await;
    if !policy.expose_details {
        return response;
    }
    let Some(detail) = response.extensions().get::<ErrorDetail>().cloned() else {
        return response;
    };

    let (mut parts, body) = response.into_parts();
    let bytes = match to_bytes(body, MAX_ERROR_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read error body");
            return Response::from_parts(parts, Body::empty());
        }
    };

    match merge_detail(&bytes, detail) {
        Some(merged) => {
            parts.headers.remove(header::CONTENT_LENGTH);
            Response::from_parts(parts, Body::from(merged))
        }
        None => Response::from_parts(parts, Body::from(bytes)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_detail_into_error_body() {
        let merged = merge_detail(
            br#"{"success":false,"error":"gone","code":"NOT_FOUND","recoverable":false}"#,
            ErrorDetail {
                details: "Not found: gone".to_string(),
                error_type: "NotFound",
            },
        )
        .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&merged).unwrap();
        assert_eq!(value["details"], "Not found: gone");
        assert_eq!(value["error_type"], "NotFound");
        assert_eq!(value["code"], "NOT_FOUND");
    }

    #[test]
    fn test_non_json_body_is_left_alone() {
        let detail = ErrorDetail {
            details: "x".to_string(),
            error_type: "NotFound",
        };
        assert!(merge_detail(b"plain text", detail).is_none());
    }
}
