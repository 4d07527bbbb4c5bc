//! HTTP API for external control
//!
//! This module provides a REST API for driving the session controller:
//! - POST /capture/start - Start a capture session
//! - POST /capture/stop - Stop the current session
//! - GET /capture/status - Query session state and stats
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
