//! HTTP router construction.

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use crate::api;
use crate::state::AppState;

/// Build the application router with all routes and middleware.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.server.cors_origin);

    Router::new()
        .route("/health", get(api::health))
        .route("/api/cron", get(api::cron))
        .route("/api/status", get(api::status))
        .route("/api/toggle-cron", get(api::toggle_cron).post(api::toggle_cron))
        .layer(cors)
        .with_state(state)
}

/// `*` allows any origin; anything else must parse as a single origin.
fn cors_layer(origin: &str) -> CorsLayer {
    if origin.trim() == "*" {
        return CorsLayer::permissive();
    }
    match HeaderValue::from_str(origin.trim()) {
        Ok(value) => CorsLayer::new()
            .allow_origin(value)
            .allow_methods(Any)
            .allow_headers(Any),
        Err(_) => {
            tracing::warn!(origin, "Invalid CORS origin, allowing any");
            CorsLayer::permissive()
        }
    }
}
