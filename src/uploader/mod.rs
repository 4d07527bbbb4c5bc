//! Outbound collaborators: object storage and the chat backend
//!
//! Both are opaque HTTP services. Failures here are reported and never affect
//! the session controller's own lifecycle.

mod http;

pub use http::{HttpUploader, HttpUploaderConfig};

use crate::error::UploadError;
use crate::media::{MediaArtifact, TranscriptEvent};
use serde::Deserialize;
use serde_json::{json, Value};

/// Ships finalized media and transcript payloads to remote collaborators
#[async_trait::async_trait]
pub trait Uploader: Send + Sync {
    /// Upload a finalized media artifact; returns its public location
    async fn upload_media(&self, artifact: MediaArtifact) -> Result<String, UploadError>;

    /// Post one transcript to the chat backend; returns the reply text, if any
    async fn send_transcript(
        &self,
        event: &TranscriptEvent,
    ) -> Result<Option<String>, UploadError>;
}

/// Transcript payload schema
///
/// Deployments disagree on the wire shape, so it is a configuration point
/// rather than a fixed contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadShape {
    /// `{"transcript": "..."}`
    Transcript,
    /// `{"user_id": "...", "text": "..."}`
    UserText,
    /// `{"user_id": "...", "text": "...", "history": "..."}`
    UserTextHistory,
}

impl PayloadShape {
    /// Serialize one transcript event into this deployment's wire shape
    pub fn serialize(&self, event: &TranscriptEvent, user_id: &str, history: &str) -> Value {
        match self {
            PayloadShape::Transcript => json!({ "transcript": event.text }),
            PayloadShape::UserText => json!({
                "user_id": user_id,
                "text": event.text,
            }),
            PayloadShape::UserTextHistory => json!({
                "user_id": user_id,
                "text": event.text,
                "history": history,
            }),
        }
    }
}
