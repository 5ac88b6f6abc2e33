pub mod client;
pub mod voices;

pub use client::{SpeechClient, SpeechError, SpeechOptions, SynthesizedAudio};
pub use voices::DEFAULT_VOICE;
