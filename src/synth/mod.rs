//! Speech synthesis and reply playback
//!
//! Converts backend reply text into audio and plays it through an
//! [`AudioSink`]. At most one playback is in flight at a time; recognition is
//! paused by the session pipeline for the whole playback window.

mod http;

pub use http::{FileSink, HttpVoiceEngine};

use crate::error::SynthesisError;
use std::sync::Arc;
use tokio::sync::{oneshot, Mutex};
use tracing::{error, info};

/// Synthesized audio ready for playback
#[derive(Debug, Clone)]
pub struct AudioClip {
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Text-to-audio capability
#[async_trait::async_trait]
pub trait VoiceEngine: Send + Sync {
    async fn synthesize(&self, text: &str) -> Result<AudioClip, SynthesisError>;
}

/// Plays one clip; resolves when playback completes
#[async_trait::async_trait]
pub trait AudioSink: Send + Sync {
    async fn play(&self, clip: AudioClip) -> Result<(), SynthesisError>;
}

/// What to do when `speak` is called while a playback is already in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlapPolicy {
    /// Wait for the current playback to finish, then play
    Queue,
    /// Reject the new playback with [`SynthesisError::Busy`]
    Reject,
}

/// An in-flight playback
pub struct PlaybackHandle {
    done: oneshot::Receiver<()>,
}

impl PlaybackHandle {
    /// Resolves when playback has ended, successfully or not
    pub async fn finished(self) {
        self.done.await.ok();
    }
}

/// Orchestrates synthesis and single-slot playback
pub struct SpeechSynthesizer {
    engine: Arc<dyn VoiceEngine>,
    sink: Arc<dyn AudioSink>,
    policy: OverlapPolicy,
    // Single playback slot; held for the full duration of a playback
    slot: Arc<Mutex<()>>,
}

impl SpeechSynthesizer {
    pub fn new(engine: Arc<dyn VoiceEngine>, sink: Arc<dyn AudioSink>, policy: OverlapPolicy) -> Self {
        Self {
            engine,
            sink,
            policy,
            slot: Arc::new(Mutex::new(())),
        }
    }

    /// Synthesize `text` and start playback
    ///
    /// The returned handle resolves when playback ends. A second call while a
    /// playback is in flight follows the configured [`OverlapPolicy`].
    pub async fn speak(&self, text: &str) -> Result<PlaybackHandle, SynthesisError> {
        let permit = match self.policy {
            OverlapPolicy::Queue => Arc::clone(&self.slot).lock_owned().await,
            OverlapPolicy::Reject => Arc::clone(&self.slot)
                .try_lock_owned()
                .map_err(|_| SynthesisError::Busy)?,
        };

        info!("Synthesizing speech ({} chars)", text.len());
        let clip = self.engine.synthesize(text).await?;

        let (done_tx, done_rx) = oneshot::channel();
        let sink = Arc::clone(&self.sink);
        tokio::spawn(async move {
            if let Err(e) = sink.play(clip).await {
                error!("Playback error: {}", e);
            }
            // The slot is released strictly after playback has ended
            drop(permit);
            done_tx.send(()).ok();
        });

        Ok(PlaybackHandle { done: done_rx })
    }
}
