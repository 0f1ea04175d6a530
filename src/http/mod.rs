//! HTTP server: the voice WebSocket plus status endpoints
//!
//! - GET /ws/audio?sample_rate=N - Voice conversation (WebSocket)
//! - GET /sessions - Stats for every live session
//! - GET /sessions/:id - Stats for one session
//! - GET /health - Health check
//! - anything else - Static frontend files

mod handlers;
mod routes;
mod socket;
mod state;

pub use routes::create_router;
pub use state::AppState;
