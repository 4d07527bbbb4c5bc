use super::state::AppState;
use crate::error::SessionError;
use crate::media::DeviceConstraints;
use crate::session::SessionStats;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use tracing::info;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct StartCaptureRequest {
    /// Request a camera track (default: true)
    #[serde(default = "default_true")]
    pub video: bool,

    /// Request a microphone track (default: true)
    #[serde(default = "default_true")]
    pub audio: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Serialize)]
pub struct StartCaptureResponse {
    pub status: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct StopCaptureResponse {
    pub status: String,
    pub stats: SessionStats,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /capture/start
/// Start a capture session
pub async fn start_capture(
    State(state): State<AppState>,
    Json(req): Json<StartCaptureRequest>,
) -> impl IntoResponse {
    info!("Start requested (video={}, audio={})", req.video, req.audio);

    let constraints = DeviceConstraints {
        video: req.video,
        audio: req.audio,
    };

    match state.controller.start(constraints).await {
        Ok(true) => (
            StatusCode::OK,
            Json(StartCaptureResponse {
                status: "capturing".to_string(),
                message: "Capture session started".to_string(),
            }),
        )
            .into_response(),
        Ok(false) => (
            StatusCode::CONFLICT,
            Json(ErrorResponse {
                error: "A capture session is already in progress".to_string(),
            }),
        )
            .into_response(),
        Err(e @ SessionError::InvalidConstraints) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response(),
        Err(e @ SessionError::DeviceAcquisitionFailed(_)) => (
            StatusCode::BAD_GATEWAY,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response(),
    }
}

/// POST /capture/stop
/// Stop the current capture session
pub async fn stop_capture(State(state): State<AppState>) -> impl IntoResponse {
    info!("Stop requested");

    let stats = state.controller.stop().await;

    (
        StatusCode::OK,
        Json(StopCaptureResponse {
            status: "stopped".to_string(),
            stats,
        }),
    )
}

/// GET /capture/status
/// Snapshot of the current session
pub async fn capture_status(State(state): State<AppState>) -> impl IntoResponse {
    let stats = state.controller.stats().await;
    (StatusCode::OK, Json(stats))
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
