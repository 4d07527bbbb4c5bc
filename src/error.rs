use thiserror::Error;

/// Errors surfaced by the session controller itself
#[derive(Debug, Error)]
pub enum SessionError {
    /// Neither video nor audio was requested
    #[error("at least one of video or audio must be enabled")]
    InvalidConstraints,

    /// The device acquirer could not hand out a live handle
    #[error("device acquisition failed: {0}")]
    DeviceAcquisitionFailed(#[from] DeviceError),
}

/// Platform signals from the device acquirer
///
/// The session controller treats both variants as the same
/// `DeviceAcquisitionFailed` class.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("permission denied by the platform")]
    PermissionDenied,

    #[error("requested device unavailable: {0}")]
    DeviceUnavailable(String),
}

/// Errors from the speech recognizer
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RecognitionError {
    /// Known-transient: no speech detected before the recognizer gave up.
    /// Retried automatically after a fixed delay.
    #[error("no speech detected")]
    NoSpeech,

    /// Any other recognition failure; surfaced without retry
    #[error("recognition failed: {0}")]
    Failed(String),
}

/// Errors from the upload collaborators (storage and chat backend)
///
/// All variants are non-fatal to the session lifecycle.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("media upload failed: {0}")]
    UploadFailed(String),

    #[error("chat backend unreachable: {0}")]
    BackendUnreachable(String),

    #[error("chat backend returned an error: status {status}")]
    BackendError { status: u16 },
}

/// Errors from the speech synthesizer
#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("speech synthesis failed: {0}")]
    SynthesisFailed(String),

    /// A playback was already in flight and the overlap policy rejects queuing
    #[error("playback already in flight")]
    Busy,
}
