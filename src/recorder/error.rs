use thiserror::Error;

use crate::audio::CaptureError;

/// Errors surfaced by the recorder's public operations.
///
/// Every failure is terminal for the current attempt: the recorder performs
/// no retries and is left idle with resources released where possible.
#[derive(Debug, Error)]
pub enum RecorderError {
    /// The host has no capture capability at all
    #[error("this host does not support media capture: {0}")]
    Unsupported(String),
    /// The user or system refused microphone access
    #[error("unable to access microphone, permission denied or an error occurred: {0}")]
    PermissionDenied(String),
    /// Protocol violation: start while a session is active
    #[error("recording is already in progress")]
    AlreadyRecording,
    /// Protocol violation: stop while idle
    #[error("no recording is currently in progress")]
    NoActiveRecording,
    /// Platform failure while stopping or materializing the blob
    #[error("failed to stop and process recording: {0}")]
    StopFailed(#[source] anyhow::Error),
}

/// Acquisition-phase mapping: anything the device reports while starting that
/// is not an outright missing capability reads as an access failure.
impl From<CaptureError> for RecorderError {
    fn from(err: CaptureError) -> Self {
        match err {
            CaptureError::Unsupported(msg) => RecorderError::Unsupported(msg),
            CaptureError::PermissionDenied(msg) => RecorderError::PermissionDenied(msg),
            CaptureError::Device(e) => RecorderError::PermissionDenied(e.to_string()),
        }
    }
}
