use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use super::handlers;
use super::state::AppState;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Recording control (press / release)
        .route("/relay/record/start", post(handlers::start_recording))
        .route("/relay/record/stop", post(handlers::stop_recording))
        // Status and settings
        .route("/relay/status", get(handlers::get_status))
        .route("/relay/voices", get(handlers::list_voices))
        .route("/relay/conversation/new", post(handlers::new_conversation))
        // Request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
