//! Continuous speech recognition
//!
//! The [`Transcriber`] wraps a [`SpeechRecognizer`] and pumps its finalized
//! results into a per-session stream of [`TranscriptEvent`]s. It owns the
//! retry policy for the known-transient no-speech failure and the pause/resume
//! gate that keeps recognition from overlapping reply playback.

mod remote;

pub use remote::{RemoteRecognizer, RemoteRecognizerConfig, RemoteRecognizerFactory};

use crate::error::RecognitionError;
use crate::media::{MediaChunk, TranscriptEvent};
use anyhow::Result;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// One event from the underlying recognizer
///
/// Only finalized results are surfaced; interim hypotheses never appear here.
#[derive(Debug, Clone)]
pub enum RecognizerEvent {
    /// A finalized recognition result
    Final(String),
    /// A recognition failure
    Error(RecognitionError),
}

/// Continuous speech recognition capability
///
/// `start` may be called again after `stop`; each call yields a fresh event
/// stream. This mirrors restartable browser-style recognizers.
#[async_trait::async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// Begin listening; returns the event stream for this run
    async fn start(&mut self) -> Result<mpsc::Receiver<RecognizerEvent>>;

    /// Stop listening. The current event stream ends.
    async fn stop(&mut self) -> Result<()>;

    /// Whether the recognizer is currently listening
    fn is_listening(&self) -> bool;
}

/// Creates one recognizer per session, fed by the session's audio track
pub trait RecognizerFactory: Send + Sync {
    fn create(&self, audio: mpsc::Receiver<MediaChunk>) -> Box<dyn SpeechRecognizer>;
}

/// Retry policy for the no-speech failure
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Delay before restarting after a no-speech error
    pub no_speech_delay: Duration,
    /// Maximum consecutive no-speech restarts before giving up
    pub max_no_speech_restarts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            no_speech_delay: Duration::from_secs(2),
            max_no_speech_restarts: 5,
        }
    }
}

/// Pumps recognizer events into a transcript stream for one session
pub struct Transcriber {
    recognizer: Arc<Mutex<Box<dyn SpeechRecognizer>>>,
    retry: RetryPolicy,
    listening_tx: watch::Sender<bool>,
    shutdown_tx: watch::Sender<bool>,
    // Bumped by pause(); lets the pump tell a paused stream from one that
    // ended on its own
    pause_epoch: Arc<AtomicU64>,
    pump_handle: Mutex<Option<JoinHandle<()>>>,
}

impl Transcriber {
    pub fn new(recognizer: Box<dyn SpeechRecognizer>, retry: RetryPolicy) -> Self {
        let (listening_tx, _) = watch::channel(false);
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            recognizer: Arc::new(Mutex::new(recognizer)),
            retry,
            listening_tx,
            shutdown_tx,
            pause_epoch: Arc::new(AtomicU64::new(0)),
            pump_handle: Mutex::new(None),
        }
    }

    /// Start recognition and return the session's transcript stream
    pub async fn start(&self) -> Result<mpsc::Receiver<TranscriptEvent>> {
        let (event_tx, event_rx) = mpsc::channel(64);

        self.listening_tx.send(true).ok();

        let recognizer = Arc::clone(&self.recognizer);
        let retry = self.retry.clone();
        let pause_epoch = Arc::clone(&self.pause_epoch);
        let mut listening_rx = self.listening_tx.subscribe();
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        let pump = tokio::spawn(async move {
            let mut restarts = 0u32;

            'outer: loop {
                // Wait until we are supposed to be listening
                loop {
                    if *shutdown_rx.borrow() {
                        break 'outer;
                    }
                    if *listening_rx.borrow() {
                        break;
                    }
                    tokio::select! {
                        res = listening_rx.changed() => {
                            if res.is_err() {
                                break 'outer;
                            }
                        }
                        res = shutdown_rx.changed() => {
                            if res.is_err() {
                                break 'outer;
                            }
                        }
                    }
                }

                let epoch_at_start = pause_epoch.load(Ordering::SeqCst);
                let mut rx = match recognizer.lock().await.start().await {
                    Ok(rx) => rx,
                    Err(e) => {
                        error!("Failed to start recognizer: {}", e);
                        break;
                    }
                };

                loop {
                    tokio::select! {
                        ev = rx.recv() => match ev {
                            Some(RecognizerEvent::Final(text)) => {
                                restarts = 0;
                                let trimmed = text.trim();
                                if trimmed.is_empty() {
                                    continue;
                                }
                                if event_tx.send(TranscriptEvent::now(trimmed)).await.is_err() {
                                    // Session no longer consuming transcripts
                                    break 'outer;
                                }
                            }
                            Some(RecognizerEvent::Error(RecognitionError::NoSpeech)) => {
                                // Known-transient: stop, back off, restart
                                if let Err(e) = recognizer.lock().await.stop().await {
                                    warn!("Recognizer stop after no-speech failed: {}", e);
                                }
                                if restarts >= retry.max_no_speech_restarts {
                                    error!(
                                        "No speech after {} restarts; giving up",
                                        restarts
                                    );
                                    break 'outer;
                                }
                                restarts += 1;
                                info!(
                                    "No speech detected; restarting recognition in {:?} (attempt {}/{})",
                                    retry.no_speech_delay, restarts, retry.max_no_speech_restarts
                                );
                                tokio::time::sleep(retry.no_speech_delay).await;
                                continue 'outer;
                            }
                            Some(RecognizerEvent::Error(e)) => {
                                // Surfaced without retry
                                warn!("Recognition error: {}", e);
                            }
                            None => {
                                if pause_epoch.load(Ordering::SeqCst) == epoch_at_start
                                    && *listening_rx.borrow()
                                {
                                    // Stream ended on its own (source exhausted)
                                    info!("Recognizer event stream ended");
                                    break 'outer;
                                }
                                // Paused; wait for resume
                                continue 'outer;
                            }
                        },
                        res = listening_rx.changed() => {
                            if res.is_err() {
                                break 'outer;
                            }
                            if !*listening_rx.borrow() {
                                // Paused; drain back to the wait loop
                                continue 'outer;
                            }
                        }
                        res = shutdown_rx.changed() => {
                            if res.is_err() || *shutdown_rx.borrow() {
                                break 'outer;
                            }
                        }
                    }
                }
            }

            info!("Transcript pump stopped");
        });

        {
            let mut handle = self.pump_handle.lock().await;
            *handle = Some(pump);
        }

        Ok(event_rx)
    }

    /// Pause recognition while synthesized playback is in flight
    ///
    /// Stops the recognizer so the system never transcribes its own voice.
    pub async fn pause(&self) -> Result<()> {
        self.pause_epoch.fetch_add(1, Ordering::SeqCst);
        self.listening_tx.send(false).ok();
        self.recognizer.lock().await.stop().await
    }

    /// Resume recognition. Must only be called after playback has ended.
    pub async fn resume(&self) -> Result<()> {
        self.listening_tx.send(true).ok();
        Ok(())
    }

    /// Stop recognition for good and wait for the pump to finish
    pub async fn stop(&self) -> Result<()> {
        self.listening_tx.send(false).ok();
        self.shutdown_tx.send(true).ok();

        if let Err(e) = self.recognizer.lock().await.stop().await {
            warn!("Recognizer stop failed: {}", e);
        }

        let handle = {
            let mut guard = self.pump_handle.lock().await;
            guard.take()
        };
        if let Some(task) = handle {
            if let Err(e) = task.await {
                error!("Transcript pump panicked: {}", e);
            }
        }

        Ok(())
    }
}
