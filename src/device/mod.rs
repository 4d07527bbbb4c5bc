//! Device acquisition
//!
//! The acquirer hands out live device handles for the requested media kinds.
//! A handle owns the OS-level tracks for its session and must be released
//! before the session is considered torn down.

mod file;

pub use file::FileDevice;

use crate::config::DeviceConfig;
use crate::error::DeviceError;
use crate::media::{DeviceConstraints, MediaChunk};
use anyhow::Result;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Requests access to camera/microphone tracks
#[async_trait::async_trait]
pub trait DeviceAcquirer: Send + Sync {
    /// Acquire live tracks for the requested media kinds
    async fn acquire(
        &self,
        constraints: DeviceConstraints,
    ) -> Result<Box<dyn DeviceHandle>, DeviceError>;
}

/// Live OS-level media tracks for one session
///
/// Each track's chunk stream can be taken at most once. `release` stops all
/// tracks and is idempotent: releasing an already-released handle is a no-op.
#[async_trait::async_trait]
pub trait DeviceHandle: Send + Sync {
    /// Take the video track's chunk stream, if video was requested
    fn take_video(&mut self) -> Option<mpsc::Receiver<MediaChunk>>;

    /// Take the audio track's chunk stream, if audio was requested
    fn take_audio(&mut self) -> Option<mpsc::Receiver<MediaChunk>>;

    /// Stop all tracks. Idempotent.
    async fn release(&mut self) -> Result<()>;

    /// Whether the handle has been released
    fn is_released(&self) -> bool;

    /// Number of tracks still live (0 after release)
    fn live_tracks(&self) -> usize;
}

/// Device acquirer factory
pub struct DeviceFactory;

impl DeviceFactory {
    /// Create a device acquirer from configuration
    pub fn create(config: &DeviceConfig) -> Result<Arc<dyn DeviceAcquirer>> {
        match config.source.as_str() {
            "file" => Ok(Arc::new(FileDevice::new(
                config.source_path.clone(),
                config.chunk_interval(),
            ))),
            other => anyhow::bail!("unsupported device source: {}", other),
        }
    }
}
