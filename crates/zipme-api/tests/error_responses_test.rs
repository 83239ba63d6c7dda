//! Error body shape and status codes over HTTP.

mod helpers;

use axum::http::StatusCode;
use helpers::{
    setup_test_app, setup_test_app_with_env, transfer_form, FRONTEND_URL, RECIPIENT, SENDER,
};
use zipme_services::test_helpers::RecordingNotifier;

const UNKNOWN_FILE: &str = "/api/transfers/fedcba9876543210fedcba9876543210/download-url";

#[tokio::test]
async fn test_details_exposed_outside_production() {
    let app = setup_test_app().await;

    let response = app.client().get(UNKNOWN_FILE).await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error_type"], "NotFound");
    assert!(body["details"]
        .as_str()
        .unwrap()
        .contains("File not found or expired"));
}

#[tokio::test]
async fn test_details_hidden_in_production() {
    let app = setup_test_app_with_env(
        RecordingNotifier::new(),
        &[("ENVIRONMENT", "production"), ("CORS_ORIGINS", FRONTEND_URL)],
    )
    .await;
    assert!(app.config.is_production());

    let response = app.client().get(UNKNOWN_FILE).await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "NOT_FOUND");
    assert!(body.get("details").is_none());
    assert!(body.get("error_type").is_none());
}

#[tokio::test]
async fn test_body_over_request_limit_is_413() {
    let app = setup_test_app().await;
    let big = vec![0u8; 5 * 1024 * 1024];

    let response = app
        .client()
        .post("/api/transfers")
        .multipart(transfer_form(SENDER, RECIPIENT, &[("big.bin", big.as_slice())]))
        .await;
    assert_eq!(response.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(app.storage.list("").await.unwrap().is_empty());
    assert!(app.notifier.sent().is_empty());
}
