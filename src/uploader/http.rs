use super::{PayloadShape, Uploader};
use crate::error::UploadError;
use crate::media::{MediaArtifact, TranscriptEvent};
use serde_json::Value;
use tracing::info;

/// Endpoints and credentials for the remote collaborators
#[derive(Debug, Clone)]
pub struct HttpUploaderConfig {
    /// Chat backend base URL
    pub backend_url: String,
    /// Path the transcript payload is posted to, e.g. "/chat" or "/transcript"
    pub transcript_path: String,
    /// Wire shape for transcript payloads
    pub payload_shape: PayloadShape,
    /// Reply field in the backend response ("response" or "responseText")
    pub reply_field: String,
    /// User id carried in user-scoped payload shapes
    pub user_id: String,
    /// Conversation history carried in history-scoped payload shapes
    pub history: String,

    /// Object storage base URL
    pub storage_url: String,
    /// Storage API key
    pub storage_key: String,
    /// Storage bucket for media artifacts
    pub bucket: String,
    /// Cache-Control value sent with uploads
    pub cache_control: String,
}

/// HTTP implementation against a Supabase-style object store and a JSON chat
/// backend
pub struct HttpUploader {
    client: reqwest::Client,
    config: HttpUploaderConfig,
}

impl HttpUploader {
    pub fn new(client: reqwest::Client, config: HttpUploaderConfig) -> Self {
        Self { client, config }
    }

    fn object_url(&self, file_name: &str) -> String {
        format!(
            "{}/storage/v1/object/{}/{}",
            self.config.storage_url.trim_end_matches('/'),
            self.config.bucket,
            file_name
        )
    }

    fn public_url(&self, file_name: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.config.storage_url.trim_end_matches('/'),
            self.config.bucket,
            file_name
        )
    }
}

#[async_trait::async_trait]
impl Uploader for HttpUploader {
    async fn upload_media(&self, artifact: MediaArtifact) -> Result<String, UploadError> {
        let url = self.object_url(&artifact.file_name);
        info!(
            "Uploading {} ({} bytes) to storage",
            artifact.file_name,
            artifact.data.len()
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.storage_key)
            .header("apikey", &self.config.storage_key)
            .header("Content-Type", &artifact.content_type)
            .header("Cache-Control", &self.config.cache_control)
            .body(artifact.data)
            .send()
            .await
            .map_err(|e| UploadError::UploadFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(UploadError::UploadFailed(format!(
                "storage returned {}",
                status
            )));
        }

        let public = self.public_url(&artifact.file_name);
        info!("Media artifact available at {}", public);
        Ok(public)
    }

    async fn send_transcript(
        &self,
        event: &TranscriptEvent,
    ) -> Result<Option<String>, UploadError> {
        let url = format!(
            "{}{}",
            self.config.backend_url.trim_end_matches('/'),
            self.config.transcript_path
        );
        let payload =
            self.config
                .payload_shape
                .serialize(event, &self.config.user_id, &self.config.history);

        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| UploadError::BackendUnreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(UploadError::BackendError {
                status: status.as_u16(),
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| UploadError::BackendUnreachable(e.to_string()))?;

        let reply = body
            .get(&self.config.reply_field)
            .and_then(Value::as_str)
            .map(str::to_string)
            .filter(|s| !s.is_empty());

        Ok(reply)
    }
}
