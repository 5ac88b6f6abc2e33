pub mod audio;
pub mod chat;
pub mod config;
pub mod http;
pub mod pipeline;
pub mod recorder;
pub mod speech;

pub use audio::{
    AudioChunk, CaptureDevice, CaptureDeviceFactory, CaptureError, MicrophoneDevice,
    MicrophoneFactory, FALLBACK_MIME_TYPE,
};
pub use chat::{ChatClient, ChatError};
pub use config::Config;
pub use http::{create_router, AppState};
pub use pipeline::{ExchangeResult, VoicePipeline};
pub use recorder::{
    AudioBlob, AudioRecorder, Clock, RecorderError, RecorderState, RecorderStats, SystemClock,
};
pub use speech::{SpeechClient, SpeechError, SpeechOptions};
