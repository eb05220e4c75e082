use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Call control
        .route("/consults/:session_id/start", post(handlers::start_call))
        .route("/consults/:session_id/stop", post(handlers::stop_call))
        // Session queries
        .route(
            "/consults/:session_id/status",
            get(handlers::get_call_status),
        )
        .route(
            "/consults/:session_id/transcript",
            get(handlers::get_call_transcript),
        )
        .route(
            "/consults/:session_id/report",
            get(handlers::get_call_report),
        )
        // The browser UI calls this API cross-origin
        .layer(CorsLayer::permissive())
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
