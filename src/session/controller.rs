use super::config::SessionConfig;
use super::stats::{SessionStats, SessionState};
use crate::device::{DeviceAcquirer, DeviceHandle};
use crate::error::SessionError;
use crate::media::DeviceConstraints;
use crate::recorder::Recorder;
use crate::synth::SpeechSynthesizer;
use crate::transcriber::{RecognizerFactory, Transcriber};
use crate::uploader::Uploader;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Orchestrates the capture lifecycle: device acquisition, recording,
/// transcription, upload, and reply playback
///
/// Owns the single source of truth for "are we capturing". At most one session
/// is active at a time; re-entrant `start` calls while not idle are no-ops.
pub struct SessionController {
    config: SessionConfig,
    acquirer: Arc<dyn DeviceAcquirer>,
    recognizers: Arc<dyn RecognizerFactory>,
    uploader: Arc<dyn Uploader>,
    synthesizer: Arc<SpeechSynthesizer>,

    inner: Mutex<Inner>,
    // Set when stop() arrives while device acquisition is still in flight
    stop_requested: AtomicBool,
}

struct Inner {
    state: SessionState,
    session: Option<Session>,
}

/// One capture episode; created on start, destroyed on stop
struct Session {
    started_at: DateTime<Utc>,
    device: Box<dyn DeviceHandle>,
    recorder: Option<Arc<Mutex<Recorder>>>,
    recorder_task: Option<JoinHandle<()>>,
    transcriber: Option<Arc<Transcriber>>,
    pipeline_task: Option<JoinHandle<()>>,
    transcripts_sent: Arc<AtomicUsize>,
}

impl SessionController {
    pub fn new(
        config: SessionConfig,
        acquirer: Arc<dyn DeviceAcquirer>,
        recognizers: Arc<dyn RecognizerFactory>,
        uploader: Arc<dyn Uploader>,
        synthesizer: Arc<SpeechSynthesizer>,
    ) -> Self {
        Self {
            config,
            acquirer,
            recognizers,
            uploader,
            synthesizer,
            inner: Mutex::new(Inner {
                state: SessionState::Idle,
                session: None,
            }),
            stop_requested: AtomicBool::new(false),
        }
    }

    /// Start a capture session
    ///
    /// Returns `Ok(true)` when a session was started, `Ok(false)` when one was
    /// already running (or a concurrent stop cancelled the start).
    pub async fn start(&self, constraints: DeviceConstraints) -> Result<bool, SessionError> {
        if constraints.is_empty() {
            return Err(SessionError::InvalidConstraints);
        }

        {
            let mut inner = self.inner.lock().await;
            if inner.state != SessionState::Idle {
                warn!("Capture already in progress; ignoring start");
                return Ok(false);
            }
            inner.state = SessionState::Starting;
        }

        info!(
            "Starting capture session (video={}, audio={})",
            constraints.video, constraints.audio
        );

        // The state lock is not held across acquisition so a concurrent stop
        // can observe Starting and request cancellation.
        let mut device = match self.acquirer.acquire(constraints).await {
            Ok(device) => device,
            Err(e) => {
                error!("Device acquisition failed: {}", e);
                self.stop_requested.store(false, Ordering::SeqCst);
                self.inner.lock().await.state = SessionState::Idle;
                return Err(SessionError::DeviceAcquisitionFailed(e));
            }
        };

        if self.stop_requested.swap(false, Ordering::SeqCst) {
            // Stop arrived while acquisition was in flight; never leave a
            // freshly acquired device live after a requested stop.
            info!("Stop requested during acquisition; releasing device");
            if let Err(e) = device.release().await {
                warn!("Device release after cancelled start failed: {}", e);
            }
            self.inner.lock().await.state = SessionState::Idle;
            return Ok(false);
        }

        let mut session = Session {
            started_at: Utc::now(),
            recorder: None,
            recorder_task: None,
            transcriber: None,
            pipeline_task: None,
            transcripts_sent: Arc::new(AtomicUsize::new(0)),
            device,
        };

        if constraints.video {
            self.start_recorder(&mut session);
        }

        if constraints.audio {
            self.start_transcription(&mut session).await;
        }

        {
            let mut inner = self.inner.lock().await;
            inner.state = SessionState::Active;
            inner.session = Some(session);
        }

        // A stop may have slipped in between the cancellation check and
        // activation; honor it now that the session is fully wired.
        if self.stop_requested.swap(false, Ordering::SeqCst) {
            info!("Stop requested during startup; tearing down immediately");
            self.stop().await;
            return Ok(false);
        }

        info!("Capture session active");
        Ok(true)
    }

    /// Buffer video chunks for the lifetime of the session
    fn start_recorder(&self, session: &mut Session) {
        let Some(mut video_rx) = session.device.take_video() else {
            warn!("Video requested but the device offered no video track");
            return;
        };

        let recorder = Arc::new(Mutex::new(Recorder::new(self.config.content_type.clone())));
        let recorder_for_task = Arc::clone(&recorder);

        let task = tokio::spawn(async move {
            while let Some(chunk) = video_rx.recv().await {
                recorder_for_task.lock().await.append(chunk);
            }
        });

        session.recorder = Some(recorder);
        session.recorder_task = Some(task);
    }

    /// Start the transcriber and the transcript → backend → playback pipeline
    async fn start_transcription(&self, session: &mut Session) {
        let audio_rx = match session.device.take_audio() {
            Some(rx) => rx,
            None => {
                warn!("Audio requested but the device offered no audio track");
                return;
            }
        };

        let recognizer = self.recognizers.create(audio_rx);
        let transcriber = Arc::new(Transcriber::new(recognizer, self.config.retry.clone()));

        let mut transcript_rx = match transcriber.start().await {
            Ok(rx) => rx,
            Err(e) => {
                error!("Failed to start transcription: {}", e);
                return;
            }
        };

        let uploader = Arc::clone(&self.uploader);
        let synthesizer = Arc::clone(&self.synthesizer);
        let transcriber_for_task = Arc::clone(&transcriber);
        let transcripts_sent = Arc::clone(&session.transcripts_sent);

        // One task per session: transcript events are processed strictly in
        // the order recognition emits them.
        let pipeline = tokio::spawn(async move {
            while let Some(event) = transcript_rx.recv().await {
                info!("Transcript: {}", event.text);

                let reply = match uploader.send_transcript(&event).await {
                    Ok(reply) => {
                        transcripts_sent.fetch_add(1, Ordering::SeqCst);
                        reply
                    }
                    Err(e) => {
                        // Collaborator-side failure; the session keeps going
                        warn!("Transcript delivery failed: {}", e);
                        continue;
                    }
                };

                let Some(reply) = reply else { continue };

                // Pause recognition so the system never hears its own voice;
                // resume only once playback has fully ended.
                if let Err(e) = transcriber_for_task.pause().await {
                    warn!("Failed to pause recognition for playback: {}", e);
                }

                match synthesizer.speak(&reply).await {
                    Ok(playback) => playback.finished().await,
                    Err(e) => {
                        warn!("Synthesis failed; skipping playback: {}", e);
                    }
                }

                if let Err(e) = transcriber_for_task.resume().await {
                    warn!("Failed to resume recognition: {}", e);
                }
            }

            info!("Transcript pipeline finished");
        });

        session.transcriber = Some(transcriber);
        session.pipeline_task = Some(pipeline);
    }

    /// Stop the current session and release every acquired resource
    ///
    /// A no-op while idle. Each teardown step is attempted independently;
    /// individual failures are logged and never prevent the controller from
    /// reaching idle.
    pub async fn stop(&self) -> SessionStats {
        let mut session = {
            let mut inner = self.inner.lock().await;
            match inner.state {
                SessionState::Idle => return SessionStats::idle(),
                SessionState::Starting => {
                    // Honored as soon as the in-flight acquisition resolves
                    self.stop_requested.store(true, Ordering::SeqCst);
                    info!("Stop requested while starting");
                    return SessionStats::idle();
                }
                SessionState::Stopping => return SessionStats::idle(),
                SessionState::Active => {
                    inner.state = SessionState::Stopping;
                    match inner.session.take() {
                        Some(s) => s,
                        None => {
                            inner.state = SessionState::Idle;
                            return SessionStats::idle();
                        }
                    }
                }
            }
        };

        info!("Stopping capture session");

        if let Some(transcriber) = &session.transcriber {
            if let Err(e) = transcriber.stop().await {
                warn!("Transcriber stop failed: {}", e);
            }
        }

        if let Err(e) = session.device.release().await {
            warn!("Device release failed: {}", e);
        }

        if let Some(task) = session.recorder_task.take() {
            if let Err(e) = task.await {
                error!("Recorder task panicked: {}", e);
            }
        }

        if let Some(task) = session.pipeline_task.take() {
            if let Err(e) = task.await {
                error!("Pipeline task panicked: {}", e);
            }
        }

        // All chunks are flushed by now; concatenate and ship the artifact.
        let mut chunks_recorded = 0;
        if let Some(recorder) = &session.recorder {
            let mut recorder = recorder.lock().await;
            chunks_recorded = recorder.chunk_count();
            if let Some(artifact) = recorder.finalize() {
                match self.uploader.upload_media(artifact).await {
                    Ok(location) => info!("Media uploaded to {}", location),
                    // The session has already torn down; failure is reported
                    // and nothing is rolled back or retried.
                    Err(e) => error!("Media upload failed: {}", e),
                }
            }
        }

        let stats = SessionStats {
            state: SessionState::Idle,
            started_at: Some(session.started_at),
            duration_secs: Utc::now()
                .signed_duration_since(session.started_at)
                .num_milliseconds() as f64
                / 1000.0,
            chunks_recorded,
            transcripts_sent: session.transcripts_sent.load(Ordering::SeqCst),
        };

        self.inner.lock().await.state = SessionState::Idle;
        info!("Capture session stopped");

        stats
    }

    /// Snapshot of the current lifecycle state
    pub async fn stats(&self) -> SessionStats {
        let inner = self.inner.lock().await;

        let Some(session) = &inner.session else {
            return SessionStats {
                state: inner.state,
                ..SessionStats::idle()
            };
        };

        let chunks_recorded = match &session.recorder {
            Some(recorder) => recorder.lock().await.chunk_count(),
            None => 0,
        };

        SessionStats {
            state: inner.state,
            started_at: Some(session.started_at),
            duration_secs: Utc::now()
                .signed_duration_since(session.started_at)
                .num_milliseconds() as f64
                / 1000.0,
            chunks_recorded,
            transcripts_sent: session.transcripts_sent.load(Ordering::SeqCst),
        }
    }

    /// Current lifecycle state
    pub async fn state(&self) -> SessionState {
        self.inner.lock().await.state
    }
}
