pub mod capture;
pub mod microphone;
pub mod wav;

pub use capture::{AudioChunk, CaptureDevice, CaptureDeviceFactory, CaptureError, FALLBACK_MIME_TYPE};
pub use microphone::{MicrophoneDevice, MicrophoneFactory};
