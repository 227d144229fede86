//! Route definitions and router setup
//!
//! Configures all API routes and middleware.

mod diagnostics;
mod layer;
mod schema;

use crate::config::Settings;
use crate::state::SharedState;
use axum::{
    extract::DefaultBodyLimit,
    http::{header, Method},
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    request_id::MakeRequestUuid,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
    ServiceBuilderExt,
};
use tracing::Level;

/// Create the application router with all routes and middleware
pub fn create_router(state: SharedState, settings: &Settings) -> Router {
    // Build CORS layer
    let cors = build_cors_layer(settings);

    // Build tracing/logging layer
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_request(DefaultOnRequest::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    // Build middleware stack
    let middleware = ServiceBuilder::new()
        .set_x_request_id(MakeRequestUuid)
        .layer(trace_layer)
        .layer(CompressionLayer::new())
        .layer(cors)
        .propagate_x_request_id();

    Router::new()
        // Health check
        .route("/health", get(health_check))

        // Schema routes
        .route("/api/schema", get(schema::get_schema).post(schema::normalize_schema))
        .route("/api/schema/relationships", get(schema::get_relationships))

        // Diagnostics routes
        .route("/api/analyze", get(diagnostics::analyze_current))
        .route("/api/diagnostics", post(diagnostics::analyze_schema))

        // Layer routes
        .route("/api/layers", get(layer::list_layers).post(layer::save_layer))
        .route("/api/layers/summary", get(layer::list_summaries))
        .route("/api/layers/{id}", get(layer::get_layer).delete(layer::delete_layer))
        .route("/api/layers/{id}/diagnostics", get(diagnostics::analyze_layer))

        // Diff and export routes
        .route("/api/diff", post(layer::diff_layers))
        .route("/api/export-sql", post(layer::export_sql))
        .route("/api/import-json", post(layer::import_json))

        // Apply middleware and state
        .layer(DefaultBodyLimit::max(settings.server.max_body_bytes))
        .layer(middleware)
        .with_state(state)
}

/// Build CORS layer from settings
fn build_cors_layer(settings: &Settings) -> CorsLayer {
    let origins: Vec<_> = settings
        .cors
        .allowed_origins
        .iter()
        .filter_map(|s| s.parse().ok())
        .collect();

    let cors = if origins.is_empty() {
        CorsLayer::new().allow_origin(Any)
    } else {
        CorsLayer::new().allow_origin(origins)
    };

    cors.allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .max_age(Duration::from_secs(3600))
}

/// Health check endpoint
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "success": true,
        "message": "Server is running fine.",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION")
    }))
}
