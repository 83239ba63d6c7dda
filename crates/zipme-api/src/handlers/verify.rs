//! Verification link target. Always answers with a redirect to the frontend.

use crate::error::log_error;
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    response::Redirect,
};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;
use zipme_core::{ErrorMetadata, PromotedTransfer};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct VerifyQuery {
    /// Token from the verification email
    pub token: Option<String>,
}

pub(crate) fn success_location(frontend_url: &str, promoted: &PromotedTransfer) -> String {
    let mut location = format!("{}/?id={}&verified=true", frontend_url, promoted.file_id);
    if !promoted.recipient_notified {
        location.push_str("&notified=false");
    }
    location
}

pub(crate) fn error_location(frontend_url: &str, message: &str) -> String {
    format!("{}/?error={}", frontend_url, urlencoding::encode(message))
}

#[utoipa::path(
    get,
    path = "/api/verify",
    tag = "transfers",
    params(VerifyQuery),
    responses(
        (status = 303, description = "Redirect to `/?id={fileId}&verified=true` on success or `/?error={message}` on failure")
    )
)]
pub async fn verify_transfer(
    State(state): State<Arc<AppState>>,
    Query(query): Query<VerifyQuery>,
) -> Redirect {
    let frontend_url = &state.transfers.settings().frontend_url;

    let Some(token) = query.token.filter(|t| !t.trim().is_empty()) else {
        return Redirect::to(&error_location(frontend_url, "Missing token"));
    };

    match state.transfers.verify(token.trim()).await {
        Ok(promoted) => Redirect::to(&success_location(frontend_url, &promoted)),
        Err(e) => {
            log_error(&e);
            Redirect::to(&error_location(frontend_url, &e.client_message()))
        }
    }
}
