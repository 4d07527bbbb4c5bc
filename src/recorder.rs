//! Media chunk buffering
//!
//! Buffers timed chunks in capture order while a session is active and
//! concatenates them into a single artifact on finalize.

use crate::media::{MediaArtifact, MediaChunk};
use tracing::{debug, info};

/// Buffers media chunks for the current session
///
/// Chunks never persist across sessions: `finalize` drains the buffer and no
/// chunk is re-emitted afterwards.
pub struct Recorder {
    chunks: Vec<MediaChunk>,
    content_type: String,
}

impl Recorder {
    pub fn new(content_type: impl Into<String>) -> Self {
        Self {
            chunks: Vec::new(),
            content_type: content_type.into(),
        }
    }

    /// Append one chunk in capture order. Empty buffers are skipped.
    pub fn append(&mut self, chunk: MediaChunk) {
        if chunk.is_empty() {
            debug!("Skipping empty chunk at {}ms", chunk.timestamp_ms);
            return;
        }
        self.chunks.push(chunk);
    }

    /// Number of chunks buffered so far
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Concatenate all buffered chunks into one artifact and clear the buffer
    ///
    /// Returns `None` when nothing was recorded.
    pub fn finalize(&mut self) -> Option<MediaArtifact> {
        if self.chunks.is_empty() {
            return None;
        }

        let chunks = std::mem::take(&mut self.chunks);
        let data: Vec<u8> = chunks.into_iter().flat_map(|c| c.data).collect();

        let extension = match self.content_type.as_str() {
            "video/webm" => "webm",
            "video/mp4" => "mp4",
            "audio/mpeg" => "mp3",
            _ => "bin",
        };
        let file_name = format!("capture-{}.{}", uuid::Uuid::new_v4(), extension);

        info!(
            "Finalized media artifact: {} ({} bytes)",
            file_name,
            data.len()
        );

        Some(MediaArtifact {
            file_name,
            content_type: self.content_type.clone(),
            data,
        })
    }
}
