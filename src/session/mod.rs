//! Capture session lifecycle
//!
//! This module provides the `SessionController` abstraction that manages:
//! - Device acquisition and leak-free release
//! - Media chunk buffering and artifact finalization
//! - Speech recognition and transcript forwarding
//! - Reply synthesis and playback gating
//! - Session state and statistics

mod config;
mod controller;
mod stats;

pub use config::SessionConfig;
pub use controller::SessionController;
pub use stats::{SessionState, SessionStats};
