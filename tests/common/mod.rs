// Scripted fake collaborators for lifecycle tests.
//
// Each fake records what the session controller did to it so tests can assert
// on acquisition, release, transcript delivery, and playback ordering.

#![allow(dead_code)]

use capture_relay::error::{DeviceError, RecognitionError, SynthesisError, UploadError};
use capture_relay::media::{DeviceConstraints, MediaArtifact, MediaChunk, TranscriptEvent};
use capture_relay::synth::{AudioClip, AudioSink, VoiceEngine};
use capture_relay::transcriber::{RecognizerEvent, RecognizerFactory, SpeechRecognizer};
use capture_relay::uploader::Uploader;
use capture_relay::DeviceAcquirer;
use capture_relay::DeviceHandle;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

// ============================================================================
// Device fakes
// ============================================================================

struct TrackSenders {
    video: Option<mpsc::Sender<MediaChunk>>,
    audio: Option<mpsc::Sender<MediaChunk>>,
}

/// Test-side view of one acquired handle
pub struct HandleProbe {
    released: AtomicBool,
    senders: Mutex<Option<TrackSenders>>,
}

impl HandleProbe {
    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }

    /// Feed one video chunk, as if the device produced it
    pub async fn send_video(&self, data: &[u8], timestamp_ms: u64) {
        let tx = self
            .senders
            .lock()
            .unwrap()
            .as_ref()
            .and_then(|s| s.video.clone());
        if let Some(tx) = tx {
            tx.send(MediaChunk {
                data: data.to_vec(),
                timestamp_ms,
            })
            .await
            .ok();
        }
    }

    /// Simulate the tracks ending on their own
    pub fn end_tracks(&self) {
        self.senders.lock().unwrap().take();
    }
}

pub struct FakeHandle {
    probe: Arc<HandleProbe>,
    video_rx: Option<mpsc::Receiver<MediaChunk>>,
    audio_rx: Option<mpsc::Receiver<MediaChunk>>,
    track_count: usize,
}

#[async_trait::async_trait]
impl DeviceHandle for FakeHandle {
    fn take_video(&mut self) -> Option<mpsc::Receiver<MediaChunk>> {
        self.video_rx.take()
    }

    fn take_audio(&mut self) -> Option<mpsc::Receiver<MediaChunk>> {
        self.audio_rx.take()
    }

    async fn release(&mut self) -> anyhow::Result<()> {
        self.probe.released.store(true, Ordering::SeqCst);
        // Stopping the tracks closes their chunk streams
        self.probe.senders.lock().unwrap().take();
        Ok(())
    }

    fn is_released(&self) -> bool {
        self.probe.is_released()
    }

    fn live_tracks(&self) -> usize {
        if self.is_released() {
            0
        } else {
            self.track_count
        }
    }
}

/// Device acquirer with optional scripted failure and acquisition delay
pub struct FakeAcquirer {
    fail_with: Option<FailureKind>,
    delay: Duration,
    probes: Mutex<Vec<Arc<HandleProbe>>>,
}

#[derive(Clone, Copy)]
pub enum FailureKind {
    PermissionDenied,
    DeviceUnavailable,
}

impl FakeAcquirer {
    pub fn new() -> Self {
        Self {
            fail_with: None,
            delay: Duration::ZERO,
            probes: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(kind: FailureKind) -> Self {
        Self {
            fail_with: Some(kind),
            ..Self::new()
        }
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::new()
        }
    }

    pub fn acquired_count(&self) -> usize {
        self.probes.lock().unwrap().len()
    }

    pub fn probe(&self, index: usize) -> Arc<HandleProbe> {
        Arc::clone(&self.probes.lock().unwrap()[index])
    }

    /// True when every handle ever acquired has been released
    pub fn all_released(&self) -> bool {
        self.probes.lock().unwrap().iter().all(|p| p.is_released())
    }
}

#[async_trait::async_trait]
impl DeviceAcquirer for FakeAcquirer {
    async fn acquire(
        &self,
        constraints: DeviceConstraints,
    ) -> Result<Box<dyn DeviceHandle>, DeviceError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match self.fail_with {
            Some(FailureKind::PermissionDenied) => return Err(DeviceError::PermissionDenied),
            Some(FailureKind::DeviceUnavailable) => {
                return Err(DeviceError::DeviceUnavailable("no camera".to_string()))
            }
            None => {}
        }

        let mut senders = TrackSenders {
            video: None,
            audio: None,
        };
        let mut video_rx = None;
        let mut audio_rx = None;
        let mut track_count = 0;

        if constraints.video {
            let (tx, rx) = mpsc::channel(64);
            senders.video = Some(tx);
            video_rx = Some(rx);
            track_count += 1;
        }
        if constraints.audio {
            let (tx, rx) = mpsc::channel(64);
            senders.audio = Some(tx);
            audio_rx = Some(rx);
            track_count += 1;
        }

        let probe = Arc::new(HandleProbe {
            released: AtomicBool::new(false),
            senders: Mutex::new(Some(senders)),
        });
        self.probes.lock().unwrap().push(Arc::clone(&probe));

        Ok(Box::new(FakeHandle {
            probe,
            video_rx,
            audio_rx,
            track_count,
        }))
    }
}

// ============================================================================
// Recognizer fakes
// ============================================================================

/// Recognizer that replays scripted event runs
///
/// Each `start` call consumes the next run and emits its events immediately;
/// the event stream then stays open until `stop`. Counters expose how often
/// the pump started and stopped recognition.
pub struct ScriptedRecognizer {
    runs: Mutex<VecDeque<Vec<RecognizerEvent>>>,
    keepalive: Mutex<Option<mpsc::Sender<RecognizerEvent>>>,
    starts: Arc<AtomicUsize>,
    stops: Arc<AtomicUsize>,
    listening: AtomicBool,
    // Set if recognition ever (re)starts while a playback is in flight
    playback_flag: Option<Arc<AtomicBool>>,
    violation: Option<Arc<AtomicBool>>,
}

#[async_trait::async_trait]
impl SpeechRecognizer for ScriptedRecognizer {
    async fn start(&mut self) -> anyhow::Result<mpsc::Receiver<RecognizerEvent>> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        self.listening.store(true, Ordering::SeqCst);

        if let (Some(flag), Some(violation)) = (&self.playback_flag, &self.violation) {
            if flag.load(Ordering::SeqCst) {
                violation.store(true, Ordering::SeqCst);
            }
        }

        let (tx, rx) = mpsc::channel(64);
        let run = self.runs.lock().unwrap().pop_front().unwrap_or_default();
        for event in run {
            tx.try_send(event).expect("scripted run fits the channel");
        }
        *self.keepalive.lock().unwrap() = Some(tx);

        Ok(rx)
    }

    async fn stop(&mut self) -> anyhow::Result<()> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        self.listening.store(false, Ordering::SeqCst);
        // Dropping the sender ends the current event stream
        self.keepalive.lock().unwrap().take();
        Ok(())
    }

    fn is_listening(&self) -> bool {
        self.listening.load(Ordering::SeqCst)
    }
}

/// Hands a single scripted recognizer to the session, sharing its counters
pub struct ScriptedRecognizerFactory {
    runs: Mutex<VecDeque<Vec<RecognizerEvent>>>,
    pub starts: Arc<AtomicUsize>,
    pub stops: Arc<AtomicUsize>,
    pub playback_flag: Option<Arc<AtomicBool>>,
    pub violation: Arc<AtomicBool>,
}

impl ScriptedRecognizerFactory {
    pub fn new(runs: Vec<Vec<RecognizerEvent>>) -> Self {
        Self {
            runs: Mutex::new(runs.into()),
            starts: Arc::new(AtomicUsize::new(0)),
            stops: Arc::new(AtomicUsize::new(0)),
            playback_flag: None,
            violation: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag every recognition (re)start that happens mid-playback
    pub fn guard_against_playback(mut self, playing: Arc<AtomicBool>) -> Self {
        self.playback_flag = Some(playing);
        self
    }

    pub fn start_count(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn overlap_violated(&self) -> bool {
        self.violation.load(Ordering::SeqCst)
    }
}

impl RecognizerFactory for ScriptedRecognizerFactory {
    fn create(&self, _audio: mpsc::Receiver<MediaChunk>) -> Box<dyn SpeechRecognizer> {
        Box::new(ScriptedRecognizer {
            runs: Mutex::new(self.runs.lock().unwrap().drain(..).collect()),
            keepalive: Mutex::new(None),
            starts: Arc::clone(&self.starts),
            stops: Arc::clone(&self.stops),
            listening: AtomicBool::new(false),
            playback_flag: self.playback_flag.clone(),
            violation: Some(Arc::clone(&self.violation)),
        })
    }
}

/// Convenience constructors for scripted events
pub fn final_result(text: &str) -> RecognizerEvent {
    RecognizerEvent::Final(text.to_string())
}

pub fn no_speech() -> RecognizerEvent {
    RecognizerEvent::Error(RecognitionError::NoSpeech)
}

pub fn recognition_failure(msg: &str) -> RecognizerEvent {
    RecognizerEvent::Error(RecognitionError::Failed(msg.to_string()))
}

// ============================================================================
// Uploader fake
// ============================================================================

/// Records everything shipped out and replays scripted backend replies
pub struct RecordingUploader {
    pub media: Mutex<Vec<MediaArtifact>>,
    pub transcripts: Mutex<Vec<TranscriptEvent>>,
    replies: Mutex<VecDeque<Option<String>>>,
    fail_media: AtomicBool,
    fail_transcripts: AtomicBool,
}

impl RecordingUploader {
    pub fn new() -> Self {
        Self {
            media: Mutex::new(Vec::new()),
            transcripts: Mutex::new(Vec::new()),
            replies: Mutex::new(VecDeque::new()),
            fail_media: AtomicBool::new(false),
            fail_transcripts: AtomicBool::new(false),
        }
    }

    pub fn with_replies(replies: Vec<Option<&str>>) -> Self {
        let uploader = Self::new();
        *uploader.replies.lock().unwrap() = replies
            .into_iter()
            .map(|r| r.map(str::to_string))
            .collect();
        uploader
    }

    pub fn fail_media_uploads(self) -> Self {
        self.fail_media.store(true, Ordering::SeqCst);
        self
    }

    pub fn fail_transcript_sends(self) -> Self {
        self.fail_transcripts.store(true, Ordering::SeqCst);
        self
    }

    pub fn uploaded_media(&self) -> Vec<MediaArtifact> {
        self.media.lock().unwrap().clone()
    }

    pub fn sent_transcripts(&self) -> Vec<String> {
        self.transcripts
            .lock()
            .unwrap()
            .iter()
            .map(|t| t.text.clone())
            .collect()
    }
}

#[async_trait::async_trait]
impl Uploader for RecordingUploader {
    async fn upload_media(&self, artifact: MediaArtifact) -> Result<String, UploadError> {
        if self.fail_media.load(Ordering::SeqCst) {
            return Err(UploadError::UploadFailed("storage down".to_string()));
        }
        let location = format!("https://storage.test/{}", artifact.file_name);
        self.media.lock().unwrap().push(artifact);
        Ok(location)
    }

    async fn send_transcript(
        &self,
        event: &TranscriptEvent,
    ) -> Result<Option<String>, UploadError> {
        if self.fail_transcripts.load(Ordering::SeqCst) {
            return Err(UploadError::BackendUnreachable("backend down".to_string()));
        }
        self.transcripts.lock().unwrap().push(event.clone());
        Ok(self.replies.lock().unwrap().pop_front().flatten())
    }
}

// ============================================================================
// Synthesis fakes
// ============================================================================

/// Voice engine that fabricates a tiny clip and records every request
pub struct CountingVoiceEngine {
    pub spoken: Mutex<Vec<String>>,
    fail: bool,
}

impl CountingVoiceEngine {
    pub fn new() -> Self {
        Self {
            spoken: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            spoken: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn spoken_texts(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl VoiceEngine for CountingVoiceEngine {
    async fn synthesize(&self, text: &str) -> Result<AudioClip, SynthesisError> {
        if self.fail {
            return Err(SynthesisError::SynthesisFailed("voice down".to_string()));
        }
        self.spoken.lock().unwrap().push(text.to_string());
        Ok(AudioClip {
            content_type: "audio/mpeg".to_string(),
            data: vec![0u8; 4],
        })
    }
}

/// Sink that holds a "playing" flag high for a fixed duration
pub struct TimedSink {
    duration: Duration,
    pub playing: Arc<AtomicBool>,
}

impl TimedSink {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            playing: Arc::new(AtomicBool::new(false)),
        }
    }
}

#[async_trait::async_trait]
impl AudioSink for TimedSink {
    async fn play(&self, _clip: AudioClip) -> Result<(), SynthesisError> {
        self.playing.store(true, Ordering::SeqCst);
        tokio::time::sleep(self.duration).await;
        self.playing.store(false, Ordering::SeqCst);
        Ok(())
    }
}
