use super::{AudioClip, AudioSink, VoiceEngine};
use crate::error::SynthesisError;
use serde_json::json;
use std::path::PathBuf;
use tracing::info;

/// Voice engine backed by an OpenAI-style speech endpoint
pub struct HttpVoiceEngine {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    voice: String,
}

impl HttpVoiceEngine {
    pub fn new(
        client: reqwest::Client,
        endpoint: String,
        api_key: String,
        model: String,
        voice: String,
    ) -> Self {
        Self {
            client,
            endpoint,
            api_key,
            model,
            voice,
        }
    }
}

#[async_trait::async_trait]
impl VoiceEngine for HttpVoiceEngine {
    async fn synthesize(&self, text: &str) -> Result<AudioClip, SynthesisError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "model": self.model,
                "voice": self.voice,
                "input": text,
            }))
            .send()
            .await
            .map_err(|e| SynthesisError::SynthesisFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SynthesisError::SynthesisFailed(format!(
                "speech endpoint returned {}",
                status
            )));
        }

        let data = response
            .bytes()
            .await
            .map_err(|e| SynthesisError::SynthesisFailed(e.to_string()))?
            .to_vec();

        info!("Synthesized {} bytes of audio", data.len());

        Ok(AudioClip {
            content_type: "audio/mpeg".to_string(),
            data,
        })
    }
}

/// Headless playback: persists the clip to a directory
///
/// Used where no audio output device exists; "playback ends" as soon as the
/// clip is fully written.
pub struct FileSink {
    output_dir: PathBuf,
}

impl FileSink {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }
}

#[async_trait::async_trait]
impl AudioSink for FileSink {
    async fn play(&self, clip: AudioClip) -> Result<(), SynthesisError> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| SynthesisError::SynthesisFailed(e.to_string()))?;

        let extension = if clip.content_type == "audio/mpeg" {
            "mp3"
        } else {
            "bin"
        };
        let path = self
            .output_dir
            .join(format!("reply-{}.{}", uuid::Uuid::new_v4(), extension));

        tokio::fs::write(&path, &clip.data)
            .await
            .map_err(|e| SynthesisError::SynthesisFailed(e.to_string()))?;

        info!("Wrote synthesized reply to {}", path.display());
        Ok(())
    }
}
