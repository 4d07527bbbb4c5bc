use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Session lifecycle states
///
/// `Idle → Starting → Active → Stopping → Idle`. Only the session controller
/// transitions this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Idle,
    Starting,
    Active,
    Stopping,
}

/// Snapshot of the current session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    /// Current lifecycle state
    pub state: SessionState,

    /// When the session started, if one exists
    pub started_at: Option<DateTime<Utc>>,

    /// Seconds since the session started
    pub duration_secs: f64,

    /// Media chunks buffered so far
    pub chunks_recorded: usize,

    /// Transcripts delivered to the chat backend
    pub transcripts_sent: usize,
}

impl SessionStats {
    /// Stats for a controller with no session
    pub fn idle() -> Self {
        Self {
            state: SessionState::Idle,
            started_at: None,
            duration_secs: 0.0,
            chunks_recorded: 0,
            transcripts_sent: 0,
        }
    }
}
