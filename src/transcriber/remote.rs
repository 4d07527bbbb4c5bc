use super::{RecognizerEvent, RecognizerFactory, SpeechRecognizer};
use crate::error::RecognitionError;
use crate::media::MediaChunk;
use anyhow::{Context, Result};
use reqwest::multipart;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Configuration for the remote transcription endpoint
#[derive(Debug, Clone)]
pub struct RemoteRecognizerConfig {
    /// OpenAI-style transcription endpoint
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
    /// MIME type of the uploaded audio chunks
    pub content_type: String,
}

/// Speech recognizer backed by a remote transcription API
///
/// Posts each audio chunk from the session's audio track to the endpoint and
/// emits one `Final` event per non-empty result. An empty result means the
/// service heard silence, which surfaces as a `NoSpeech` error so the
/// transcriber's retry policy can kick in.
pub struct RemoteRecognizer {
    client: reqwest::Client,
    config: RemoteRecognizerConfig,
    // The audio track survives across start/stop cycles within a session
    audio: Arc<Mutex<Option<mpsc::Receiver<MediaChunk>>>>,
    listening: Arc<AtomicBool>,
    shutdown_tx: watch::Sender<bool>,
    worker: Option<JoinHandle<()>>,
}

impl RemoteRecognizer {
    pub fn new(
        client: reqwest::Client,
        config: RemoteRecognizerConfig,
        audio: mpsc::Receiver<MediaChunk>,
    ) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            client,
            config,
            audio: Arc::new(Mutex::new(Some(audio))),
            listening: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
            worker: None,
        }
    }

    async fn transcribe_chunk(
        client: &reqwest::Client,
        config: &RemoteRecognizerConfig,
        chunk: MediaChunk,
    ) -> Result<String> {
        let part = multipart::Part::bytes(chunk.data)
            .file_name(format!("chunk-{}.bin", chunk.timestamp_ms))
            .mime_str(&config.content_type)
            .context("Invalid audio content type")?;

        let form = multipart::Form::new()
            .part("file", part)
            .text("model", config.model.clone());

        let response = client
            .post(&config.endpoint)
            .bearer_auth(&config.api_key)
            .multipart(form)
            .send()
            .await
            .context("Transcription request failed")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("transcription endpoint returned {}", status);
        }

        let body: Value = response
            .json()
            .await
            .context("Invalid transcription response")?;

        Ok(body
            .get("text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string())
    }
}

#[async_trait::async_trait]
impl SpeechRecognizer for RemoteRecognizer {
    async fn start(&mut self) -> Result<mpsc::Receiver<RecognizerEvent>> {
        if self.listening.swap(true, Ordering::SeqCst) {
            anyhow::bail!("recognizer already listening");
        }

        self.shutdown_tx.send(false).ok();

        let (event_tx, event_rx) = mpsc::channel(16);
        let client = self.client.clone();
        let config = self.config.clone();
        let audio = Arc::clone(&self.audio);
        let listening = Arc::clone(&self.listening);
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        let worker = tokio::spawn(async move {
            info!("Remote recognizer listening");

            loop {
                let chunk = {
                    let mut guard = audio.lock().await;
                    let Some(rx) = guard.as_mut() else { break };
                    tokio::select! {
                        chunk = rx.recv() => chunk,
                        res = shutdown_rx.changed() => {
                            if res.is_err() || *shutdown_rx.borrow() {
                                break;
                            }
                            continue;
                        }
                    }
                };

                let Some(chunk) = chunk else {
                    // Audio track ended; the event stream closes with us
                    break;
                };
                if chunk.is_empty() {
                    continue;
                }

                let event = match Self::transcribe_chunk(&client, &config, chunk).await {
                    Ok(text) if text.trim().is_empty() => {
                        RecognizerEvent::Error(RecognitionError::NoSpeech)
                    }
                    Ok(text) => RecognizerEvent::Final(text),
                    Err(e) => {
                        warn!("Chunk transcription failed: {}", e);
                        RecognizerEvent::Error(RecognitionError::Failed(e.to_string()))
                    }
                };

                if event_tx.send(event).await.is_err() {
                    break;
                }
            }

            listening.store(false, Ordering::SeqCst);
            info!("Remote recognizer stopped listening");
        });

        self.worker = Some(worker);
        Ok(event_rx)
    }

    async fn stop(&mut self) -> Result<()> {
        if !self.listening.load(Ordering::SeqCst) && self.worker.is_none() {
            return Ok(());
        }

        self.shutdown_tx.send(true).ok();

        if let Some(worker) = self.worker.take() {
            if let Err(e) = worker.await {
                warn!("Recognizer worker panicked: {}", e);
            }
        }

        self.listening.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_listening(&self) -> bool {
        self.listening.load(Ordering::SeqCst)
    }
}

/// Builds one [`RemoteRecognizer`] per session
pub struct RemoteRecognizerFactory {
    client: reqwest::Client,
    config: RemoteRecognizerConfig,
}

impl RemoteRecognizerFactory {
    pub fn new(client: reqwest::Client, config: RemoteRecognizerConfig) -> Self {
        Self { client, config }
    }
}

impl RecognizerFactory for RemoteRecognizerFactory {
    fn create(&self, audio: mpsc::Receiver<MediaChunk>) -> Box<dyn SpeechRecognizer> {
        Box::new(RemoteRecognizer::new(
            self.client.clone(),
            self.config.clone(),
            audio,
        ))
    }
}
