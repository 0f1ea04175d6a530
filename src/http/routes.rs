use super::handlers;
use super::socket;
use super::state::AppState;
use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    let static_dir = ServeDir::new(&state.config.service.static_dir)
        .append_index_html_on_directories(true);

    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Voice conversation transport
        .route("/ws/audio", get(socket::audio_socket))
        // Session queries
        .route("/sessions", get(handlers::list_sessions))
        .route("/sessions/:session_id", get(handlers::get_session_status))
        // Frontend assets
        .fallback_service(static_dir)
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
