use crate::synth::OverlapPolicy;
use crate::transcriber::RetryPolicy;
use crate::uploader::PayloadShape;
use anyhow::Result;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub device: DeviceConfig,
    pub recognizer: RecognizerConfig,
    pub backend: BackendConfig,
    pub storage: StorageConfig,
    pub synthesis: SynthesisConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct DeviceConfig {
    /// Device source kind ("file")
    pub source: String,
    /// Path replayed by the file source
    pub source_path: String,
    /// MIME type of the captured media
    pub content_type: String,
    /// Chunk emission cadence in milliseconds
    #[serde(default = "default_chunk_interval_ms")]
    pub chunk_interval_ms: u64,
}

fn default_chunk_interval_ms() -> u64 {
    1000
}

impl DeviceConfig {
    pub fn chunk_interval(&self) -> Duration {
        Duration::from_millis(self.chunk_interval_ms)
    }
}

#[derive(Debug, Deserialize)]
pub struct RecognizerConfig {
    /// Transcription endpoint
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
    /// Delay before restarting after a no-speech error, in milliseconds
    #[serde(default = "default_no_speech_delay_ms")]
    pub no_speech_delay_ms: u64,
    /// Cap on consecutive no-speech restarts
    #[serde(default = "default_max_no_speech_restarts")]
    pub max_no_speech_restarts: u32,
}

fn default_no_speech_delay_ms() -> u64 {
    2000
}

fn default_max_no_speech_restarts() -> u32 {
    5
}

impl RecognizerConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            no_speech_delay: Duration::from_millis(self.no_speech_delay_ms),
            max_no_speech_restarts: self.max_no_speech_restarts,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BackendConfig {
    /// Chat backend base URL
    pub url: String,
    /// Path transcripts are posted to
    #[serde(default = "default_transcript_path")]
    pub transcript_path: String,
    /// Wire shape for transcript payloads
    pub payload_shape: PayloadShape,
    /// Reply field name in backend responses
    #[serde(default = "default_reply_field")]
    pub reply_field: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub history: String,
}

fn default_transcript_path() -> String {
    "/chat".to_string()
}

fn default_reply_field() -> String {
    "response".to_string()
}

#[derive(Debug, Deserialize)]
pub struct StorageConfig {
    pub url: String,
    pub key: String,
    pub bucket: String,
    #[serde(default = "default_cache_control")]
    pub cache_control: String,
}

fn default_cache_control() -> String {
    "3600".to_string()
}

#[derive(Debug, Deserialize)]
pub struct SynthesisConfig {
    /// Speech endpoint
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
    pub voice: String,
    /// "queue" or "reject"
    #[serde(default = "default_overlap_policy")]
    pub overlap_policy: String,
    /// Where headless playback persists reply audio
    pub output_dir: String,
}

fn default_overlap_policy() -> String {
    "queue".to_string()
}

impl SynthesisConfig {
    pub fn policy(&self) -> Result<OverlapPolicy> {
        match self.overlap_policy.as_str() {
            "queue" => Ok(OverlapPolicy::Queue),
            "reject" => Ok(OverlapPolicy::Reject),
            other => anyhow::bail!("unknown overlap policy: {}", other),
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            // Secrets and endpoints can come from the environment,
            // e.g. CAPTURE_RELAY__STORAGE__KEY
            .add_source(config::Environment::with_prefix("CAPTURE_RELAY").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
