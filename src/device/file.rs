use super::{DeviceAcquirer, DeviceHandle};
use crate::error::DeviceError;
use crate::media::{DeviceConstraints, MediaChunk};
use anyhow::Result;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// File-backed device source
///
/// Replays a local media file as if it were a live device: every requested
/// track emits one chunk per interval until the file is exhausted. Useful for
/// headless deployments and batch processing.
pub struct FileDevice {
    path: PathBuf,
    chunk_interval: Duration,
}

impl FileDevice {
    pub fn new(path: impl Into<PathBuf>, chunk_interval: Duration) -> Self {
        Self {
            path: path.into(),
            chunk_interval,
        }
    }
}

#[async_trait::async_trait]
impl DeviceAcquirer for FileDevice {
    async fn acquire(
        &self,
        constraints: DeviceConstraints,
    ) -> Result<Box<dyn DeviceHandle>, DeviceError> {
        let data = tokio::fs::read(&self.path).await.map_err(|e| {
            DeviceError::DeviceUnavailable(format!("{}: {}", self.path.display(), e))
        })?;

        info!(
            "Acquired file device: {} ({} bytes)",
            self.path.display(),
            data.len()
        );

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let live_tracks = Arc::new(AtomicUsize::new(0));
        let mut handle = FileDeviceHandle {
            video_rx: None,
            audio_rx: None,
            tracks: Vec::new(),
            shutdown_tx,
            released: AtomicBool::new(false),
            live_tracks: Arc::clone(&live_tracks),
        };

        // Chunk size: spread the file over roughly ten intervals so short
        // sessions still see multiple chunks.
        let chunk_size = (data.len() / 10).max(1);

        if constraints.video {
            let (tx, rx) = mpsc::channel(64);
            handle.video_rx = Some(rx);
            handle.tracks.push(spawn_track(
                data.clone(),
                chunk_size,
                self.chunk_interval,
                tx,
                shutdown_rx.clone(),
                Arc::clone(&live_tracks),
            ));
        }

        if constraints.audio {
            let (tx, rx) = mpsc::channel(64);
            handle.audio_rx = Some(rx);
            handle.tracks.push(spawn_track(
                data,
                chunk_size,
                self.chunk_interval,
                tx,
                shutdown_rx,
                Arc::clone(&live_tracks),
            ));
        }

        Ok(Box::new(handle))
    }
}

/// Emit file slices on a fixed cadence until exhausted or shut down
fn spawn_track(
    data: Vec<u8>,
    chunk_size: usize,
    interval: Duration,
    tx: mpsc::Sender<MediaChunk>,
    mut shutdown_rx: watch::Receiver<bool>,
    live_tracks: Arc<AtomicUsize>,
) -> JoinHandle<()> {
    live_tracks.fetch_add(1, Ordering::SeqCst);

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        let interval_ms = interval.as_millis() as u64;
        let mut offset = 0usize;
        let mut elapsed_ms = 0u64;

        while offset < data.len() {
            tokio::select! {
                _ = ticker.tick() => {}
                res = shutdown_rx.changed() => {
                    // A closed channel means the handle is gone; stop either way
                    if res.is_err() || *shutdown_rx.borrow() {
                        break;
                    }
                }
            }

            let end = (offset + chunk_size).min(data.len());
            let chunk = MediaChunk {
                data: data[offset..end].to_vec(),
                timestamp_ms: elapsed_ms,
            };
            offset = end;
            elapsed_ms += interval_ms;

            tokio::select! {
                sent = tx.send(chunk) => {
                    if sent.is_err() {
                        // Receiver dropped; the session no longer wants this track
                        break;
                    }
                }
                res = shutdown_rx.changed() => {
                    if res.is_err() || *shutdown_rx.borrow() {
                        break;
                    }
                }
            }
        }

        live_tracks.fetch_sub(1, Ordering::SeqCst);
    })
}

struct FileDeviceHandle {
    video_rx: Option<mpsc::Receiver<MediaChunk>>,
    audio_rx: Option<mpsc::Receiver<MediaChunk>>,
    tracks: Vec<JoinHandle<()>>,
    shutdown_tx: watch::Sender<bool>,
    released: AtomicBool,
    live_tracks: Arc<AtomicUsize>,
}

#[async_trait::async_trait]
impl DeviceHandle for FileDeviceHandle {
    fn take_video(&mut self) -> Option<mpsc::Receiver<MediaChunk>> {
        self.video_rx.take()
    }

    fn take_audio(&mut self) -> Option<mpsc::Receiver<MediaChunk>> {
        self.audio_rx.take()
    }

    async fn release(&mut self) -> Result<()> {
        if self.released.swap(true, Ordering::SeqCst) {
            return Ok(()); // already released
        }

        self.shutdown_tx.send(true).ok();

        for track in self.tracks.drain(..) {
            if let Err(e) = track.await {
                warn!("Track task panicked during release: {}", e);
            }
        }

        info!("File device released");
        Ok(())
    }

    fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }

    fn live_tracks(&self) -> usize {
        self.live_tracks.load(Ordering::SeqCst)
    }
}
