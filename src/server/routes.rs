//! Router configuration for the proxy server.

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use super::handlers;
use super::AppState;

/// Create the main router with all routes.
///
/// CORS headers are set per-response by the relay (the player needs an exact
/// header set on media responses), so no blanket CORS layer is applied here.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::home))
        .route("/test", get(handlers::test_page))
        // Extraction and relay
        .route("/extract", get(handlers::extract))
        .route("/hls", get(handlers::hls))
        .route("/mp4", get(handlers::mp4))
        .route("/segment", get(handlers::segment))
        .route("/mpd", get(handlers::mpd))
        // Operator actions
        .route("/clear-cache", get(handlers::clear_cache))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
