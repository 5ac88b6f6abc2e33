use anyhow::anyhow;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::audio::{
    AudioChunk, CaptureDevice, CaptureDeviceFactory, MicrophoneFactory, FALLBACK_MIME_TYPE,
};

use super::clock::{Clock, SystemClock};
use super::error::RecorderError;

/// Recorder lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecorderState {
    Idle,
    PermissionRequested,
    Recording,
    Stopping,
}

/// The single concatenated audio object produced by a successful stop.
/// Immutable once produced; the consumer is responsible for any further
/// encoding (e.g. base64) before transmission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioBlob {
    pub data: Vec<u8>,
    pub mime_type: String,
}

/// Point-in-time view of the recorder, for status reporting
#[derive(Debug, Clone, Serialize)]
pub struct RecorderStats {
    pub state: RecorderState,
    pub started_at: Option<DateTime<Utc>>,
    pub chunks_received: usize,
    pub last_duration_ms: Option<u64>,
}

/// Everything owned by one recording session. Exists only between a
/// successful start and the matching stop; a fresh one is allocated per
/// session so nothing carries over.
struct ActiveSession {
    device: Box<dyn CaptureDevice>,
    chunks: Arc<Mutex<Vec<AudioChunk>>>,
    collector: JoinHandle<()>,
    started: Instant,
}

struct Status {
    state: RecorderState,
    started_at: Option<DateTime<Utc>>,
    last_duration: Option<Duration>,
}

/// Manages one recording session at a time: acquire the microphone,
/// accumulate audio chunks, stop and materialize the result as a single
/// blob, release the hardware.
///
/// `start_recording` and `stop_recording` each suspend the caller until
/// their asynchronous step resolves; a second call while one is pending is
/// rejected rather than queued. There is no cancellation and no retry.
pub struct AudioRecorder {
    factory: Box<dyn CaptureDeviceFactory>,
    clock: Arc<dyn Clock>,

    /// Operation lock; `try_lock` failure means a start/stop is in flight
    session: Mutex<Option<ActiveSession>>,

    status: std::sync::Mutex<Status>,
    chunks_received: Arc<AtomicUsize>,
}

impl AudioRecorder {
    pub fn new(factory: Box<dyn CaptureDeviceFactory>, clock: Arc<dyn Clock>) -> Self {
        Self {
            factory,
            clock,
            session: Mutex::new(None),
            status: std::sync::Mutex::new(Status {
                state: RecorderState::Idle,
                started_at: None,
                last_duration: None,
            }),
            chunks_received: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Recorder wired to the system microphone and clock
    pub fn for_microphone() -> Self {
        Self::new(Box::new(MicrophoneFactory), Arc::new(SystemClock))
    }

    /// Begin a new recording session.
    ///
    /// Acquisition and capture start are atomic from the caller's view:
    /// on return the device is delivering chunks. Fails with
    /// `AlreadyRecording` if a session is active or another operation is
    /// pending, and with `Unsupported` / `PermissionDenied` when the host
    /// refuses the device; those failures leave no session state behind.
    pub async fn start_recording(&self) -> Result<(), RecorderError> {
        let mut session = self
            .session
            .try_lock()
            .map_err(|_| RecorderError::AlreadyRecording)?;

        if session.is_some() {
            return Err(RecorderError::AlreadyRecording);
        }

        self.set_state(RecorderState::PermissionRequested);

        let mut device = self.factory.create();
        debug!("Acquiring capture device: {}", device.name());

        let mut chunk_rx = match device.start().await {
            Ok(rx) => rx,
            Err(e) => {
                self.set_state(RecorderState::Idle);
                warn!("Capture acquisition failed: {}", e);
                return Err(e.into());
            }
        };

        // Fresh session state, allocated only after acquisition succeeded
        let chunks: Arc<Mutex<Vec<AudioChunk>>> = Arc::new(Mutex::new(Vec::new()));
        self.chunks_received.store(0, Ordering::SeqCst);
        let started = self.clock.now();
        let started_at = Utc::now();

        let collector_chunks = Arc::clone(&chunks);
        let counter = Arc::clone(&self.chunks_received);

        // Appends every delivered chunk in arrival order; ends when the
        // device closes its channel as part of stopping.
        let collector = tokio::spawn(async move {
            while let Some(chunk) = chunk_rx.recv().await {
                debug!(
                    "Audio chunk received: {} bytes at {}ms",
                    chunk.data.len(),
                    chunk.timestamp_ms
                );
                collector_chunks.lock().await.push(chunk);
                counter.fetch_add(1, Ordering::SeqCst);
            }
            debug!("Chunk channel closed");
        });

        *session = Some(ActiveSession {
            device,
            chunks,
            collector,
            started,
        });

        {
            let mut status = self.status.lock().unwrap();
            status.state = RecorderState::Recording;
            status.started_at = Some(started_at);
        }

        info!("Recording started");
        Ok(())
    }

    /// Stop the active session and materialize the blob.
    ///
    /// The device handle is taken out of the session before the stop request
    /// is issued, so a second concurrent stop is rejected rather than racing
    /// this one. The blob is built only after the device's buffered stop has
    /// completed and the collector has drained; the hardware is released
    /// exactly once regardless of outcome.
    pub async fn stop_recording(&self) -> Result<AudioBlob, RecorderError> {
        let mut session_slot = self
            .session
            .try_lock()
            .map_err(|_| RecorderError::NoActiveRecording)?;

        let session = session_slot.take().ok_or(RecorderError::NoActiveRecording)?;
        self.set_state(RecorderState::Stopping);

        let ActiveSession {
            mut device,
            chunks,
            collector,
            started,
        } = session;

        let elapsed = self.clock.now().duration_since(started);

        // Buffered stop: resolves after the device flushed remaining chunks
        // and closed its channel.
        let stop_result = device.stop().await;

        let collector_result = match &stop_result {
            Ok(()) => collector.await,
            Err(_) => {
                // The channel may never close after a failed stop; don't
                // wait on it.
                collector.abort();
                Ok(())
            }
        };

        let mime_type = device
            .mime_type()
            .unwrap_or_else(|| FALLBACK_MIME_TYPE.to_string());

        // Hardware release happens here no matter how the stop went
        drop(device);

        {
            let mut status = self.status.lock().unwrap();
            status.state = RecorderState::Idle;
            status.started_at = None;
            status.last_duration = Some(elapsed);
        }

        stop_result.map_err(|e| RecorderError::StopFailed(anyhow!(e)))?;
        collector_result
            .map_err(|e| RecorderError::StopFailed(anyhow!("chunk collector failed: {e}")))?;

        let chunks = chunks.lock().await;
        let mut data = Vec::with_capacity(chunks.iter().map(|c| c.data.len()).sum());
        for chunk in chunks.iter() {
            data.extend_from_slice(&chunk.data);
        }

        info!(
            "Recording stopped: {} chunks, {} bytes, {:.2}s",
            chunks.len(),
            data.len(),
            elapsed.as_secs_f64()
        );

        Ok(AudioBlob { data, mime_type })
    }

    /// Current recorder status
    pub fn stats(&self) -> RecorderStats {
        let status = self.status.lock().unwrap();
        RecorderStats {
            state: status.state,
            started_at: status.started_at,
            chunks_received: self.chunks_received.load(Ordering::SeqCst),
            last_duration_ms: status.last_duration.map(|d| d.as_millis() as u64),
        }
    }

    fn set_state(&self, state: RecorderState) {
        self.status.lock().unwrap().state = state;
    }
}
