use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which media kinds a capture session should request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConstraints {
    /// Request a camera track
    pub video: bool,
    /// Request a microphone track
    pub audio: bool,
}

impl DeviceConstraints {
    /// True when neither media kind is requested
    pub fn is_empty(&self) -> bool {
        !self.video && !self.audio
    }
}

/// One timed slice of recorded media, emitted by the device at a fixed
/// one-second cadence while a session is active
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaChunk {
    /// Opaque encoded bytes for this slice
    pub data: Vec<u8>,
    /// Milliseconds since the track started
    pub timestamp_ms: u64,
}

impl MediaChunk {
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// The finalized concatenation of all chunks recorded during one session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaArtifact {
    /// Generated object name, e.g. "capture-<uuid>.webm"
    pub file_name: String,
    /// MIME type of the encoded media
    pub content_type: String,
    /// Concatenated chunk bytes, in capture order
    pub data: Vec<u8>,
}

/// One finalized speech-recognition result
///
/// Immutable; forwarded to the chat backend as soon as it is emitted,
/// never stored across sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptEvent {
    /// Trimmed transcript text
    pub text: String,
    /// When this result was finalized
    pub timestamp: DateTime<Utc>,
}

impl TranscriptEvent {
    pub fn now(text: impl Into<String>) -> Self {
        Self {
            text: text.into().trim().to_string(),
            timestamp: Utc::now(),
        }
    }
}
