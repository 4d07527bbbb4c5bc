use crate::transcriber::RetryPolicy;

/// Controller-level settings shared by every session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// MIME type tagged onto finalized media artifacts
    pub content_type: String,

    /// No-speech retry policy handed to each session's transcriber
    pub retry: RetryPolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            content_type: "video/webm".to_string(),
            retry: RetryPolicy::default(),
        }
    }
}
