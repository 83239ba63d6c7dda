//! Route configuration and setup

use crate::api_doc::ApiDoc;
use crate::handlers;
use crate::middleware::{error_details_middleware, request_id_middleware, ErrorDetailPolicy};
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use zipme_core::Config;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router, anyhow::Error> {
    let cors = setup_cors(config)?;

    // Server-level concurrency limit; every upload is buffered in memory.
    let http_concurrency_limit = config.http_concurrency_limit;
    let body_limit = usize::try_from(config.max_request_size_bytes).unwrap_or(usize::MAX);
    tracing::info!(
        http_concurrency_limit,
        max_request_size_bytes = config.max_request_size_bytes,
        "HTTP limits configured"
    );

    let app = Router::new()
        .route("/api/transfers", post(handlers::transfers::create_transfer))
        .route(
            "/api/transfers/{file_id}/download-url",
            get(handlers::transfers::get_download_url),
        )
        .route("/api/verify", get(handlers::verify::verify_transfer))
        .route(
            "/download/{file_id}",
            get(handlers::transfers::download_redirect),
        )
        .route(
            "/storage/{*key}",
            get(handlers::storage_files::serve_signed_file),
        )
        .route("/health", get(handlers::health::health_check))
        .route("/live", get(handlers::health::liveness_check))
        .route(
            "/api/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .layer(axum::middleware::from_fn_with_state(
            ErrorDetailPolicy::from_config(config),
            error_details_middleware,
        ))
        .layer(DefaultBodyLimit::disable())
        .layer(ConcurrencyLimitLayer::new(http_concurrency_limit))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(request_id_middleware))
        .with_state(state);

    Ok(app)
}

/// Setup CORS configuration
fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let methods = [Method::GET, Method::POST, Method::OPTIONS];

    let cors = if config.cors_origins.iter().any(|o| o == "*") {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any)
    } else {
        let origins = config
            .cors_origins
            .iter()
            .map(|o| {
                o.parse::<HeaderValue>()
                    .map_err(|e| anyhow::anyhow!("Invalid CORS origin '{}': {}", o, e))
            })
            .collect::<Result<Vec<_>, _>>()?;

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(Any)
    };
    Ok(cors)
}
