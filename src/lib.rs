pub mod config;
pub mod device;
pub mod error;
pub mod http;
pub mod media;
pub mod recorder;
pub mod session;
pub mod synth;
pub mod transcriber;
pub mod uploader;

pub use config::Config;
pub use device::{DeviceAcquirer, DeviceFactory, DeviceHandle, FileDevice};
pub use error::{DeviceError, RecognitionError, SessionError, SynthesisError, UploadError};
pub use http::{create_router, AppState};
pub use media::{DeviceConstraints, MediaArtifact, MediaChunk, TranscriptEvent};
pub use recorder::Recorder;
pub use session::{SessionConfig, SessionController, SessionState, SessionStats};
pub use synth::{
    AudioClip, AudioSink, OverlapPolicy, PlaybackHandle, SpeechSynthesizer, VoiceEngine,
};
pub use transcriber::{
    RecognizerEvent, RecognizerFactory, RetryPolicy, SpeechRecognizer, Transcriber,
};
pub use uploader::{HttpUploader, HttpUploaderConfig, PayloadShape, Uploader};
