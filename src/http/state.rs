use std::path::PathBuf;
use std::sync::Arc;

use crate::pipeline::VoicePipeline;
use crate::recorder::AudioRecorder;
use crate::speech::SpeechOptions;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// The single recorder instance behind the control surface
    pub recorder: Arc<AudioRecorder>,
    /// Chat + speech orchestration
    pub pipeline: Arc<VoicePipeline>,
    /// Voice parameters used when a stop request carries no overrides
    pub speech_defaults: SpeechOptions,
    /// Optional directory for archiving utterances as WAV
    pub captures_dir: Option<PathBuf>,
}
