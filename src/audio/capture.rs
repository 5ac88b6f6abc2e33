use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

/// MIME type assumed for a blob when the capture device does not report one
pub const FALLBACK_MIME_TYPE: &str = "audio/webm";

/// One discrete unit of encoded audio delivered asynchronously during capture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioChunk {
    /// Raw encoded audio bytes
    pub data: Vec<u8>,
    /// Milliseconds since capture started, as reported by the device
    pub timestamp_ms: u64,
}

/// Errors raised while acquiring or driving a capture device
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The host has no capture capability at all
    #[error("this host does not support media capture: {0}")]
    Unsupported(String),
    /// The user or system refused access to the microphone
    #[error("unable to access microphone, permission denied or an error occurred: {0}")]
    PermissionDenied(String),
    /// Any other device failure
    #[error(transparent)]
    Device(#[from] anyhow::Error),
}

/// Capture device abstraction
///
/// Turns a microphone into discrete audio chunks over time. Implementations:
/// - Microphone: cpal input stream on the default input device
/// - Tests: scripted devices emitting synthetic chunks deterministically
#[async_trait]
pub trait CaptureDevice: Send + Sync {
    /// Request permission, acquire the hardware and begin capturing.
    ///
    /// Returns a channel receiver that will receive audio chunks in delivery
    /// order. The channel closes once a stop has fully flushed.
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioChunk>, CaptureError>;

    /// Stop capturing.
    ///
    /// Resolves only after the device has flushed any buffered chunks and
    /// closed its chunk channel.
    async fn stop(&mut self) -> Result<(), CaptureError>;

    /// Negotiated MIME type of the emitted chunks, if known
    fn mime_type(&self) -> Option<String>;

    /// Device name for logging
    fn name(&self) -> &str;
}

/// Produces a fresh capture device for each recording session
pub trait CaptureDeviceFactory: Send + Sync {
    fn create(&self) -> Box<dyn CaptureDevice>;
}
