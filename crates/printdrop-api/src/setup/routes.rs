//! Route configuration and setup.

use crate::constants::API_PREFIX;
use crate::handlers::{backup, health, photos, settings, status};
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{get, post},
    Router,
};
use printdrop_core::ServerConfig;
use std::sync::Arc;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Setup all application routes
pub fn setup_routes(
    config: &ServerConfig,
    state: Arc<AppState>,
) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors();

    let api_routes = Router::new()
        .route("/photos", post(photos::upload_photos))
        .route("/backup", get(backup::list_backup))
        .route("/backup/archive", get(backup::download_backup_archive))
        .route("/status", get(status::pipeline_status))
        .route("/settings", get(settings::get_settings));

    tracing::info!(
        http_concurrency_limit = config.http_concurrency_limit,
        max_request_body_bytes = config.max_request_body_bytes,
        "HTTP limits enabled"
    );

    // Per-file size policy lives in the ingestion service; the transport only
    // caps the whole request.
    let app = Router::new()
        .route("/health", get(health::health_check))
        .nest(API_PREFIX, api_routes)
        .layer(ConcurrencyLimitLayer::new(config.http_concurrency_limit))
        .layer(RequestBodyLimitLayer::new(config.max_request_body_bytes))
        .layer(DefaultBodyLimit::disable())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(app)
}

fn setup_cors() -> CorsLayer {
    let origins: Vec<String> = std::env::var("CORS_ORIGINS")
        .unwrap_or_else(|_| "*".to_string())
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        cors.allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        cors.allow_origin(origins)
    }
}
