use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use super::voices::DEFAULT_VOICE;

/// Rate adjustment bounds, in percent
pub const RATE_RANGE: std::ops::RangeInclusive<i32> = -50..=50;
/// Pitch offset bounds, in Hz
pub const PITCH_RANGE: std::ops::RangeInclusive<i32> = -20..=20;

/// Voice parameters for one synthesis request
#[derive(Debug, Clone)]
pub struct SpeechOptions {
    /// Voice identifier string, e.g. "en-US-RogerNeural - en-US (Male)"
    pub voice: String,
    /// Rate adjustment in percent, -50 to 50
    pub rate: i32,
    /// Pitch offset in Hz, -20 to 20
    pub pitch: i32,
}

impl Default for SpeechOptions {
    fn default() -> Self {
        Self {
            voice: DEFAULT_VOICE.to_string(),
            rate: 0,
            pitch: 0,
        }
    }
}

impl SpeechOptions {
    /// Reject out-of-range parameters before any request is made
    pub fn validate(&self) -> Result<(), SpeechError> {
        if !RATE_RANGE.contains(&self.rate) {
            return Err(SpeechError::RateOutOfRange(self.rate));
        }
        if !PITCH_RANGE.contains(&self.pitch) {
            return Err(SpeechError::PitchOutOfRange(self.pitch));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    text: &'a str,
    voice: &'a str,
    rate: i32,
    pitch: i32,
}

/// Playable audio resource produced by the endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct SynthesizedAudio {
    pub url: String,
}

#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("speech rate {0}% is outside the supported range -50 to 50")]
    RateOutOfRange(i32),
    #[error("speech pitch {0} Hz is outside the supported range -20 to 20")]
    PitchOutOfRange(i32),
    #[error("speech synthesis request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("speech synthesis endpoint returned {status}: {message}")]
    Endpoint { status: StatusCode, message: String },
}

/// Client for the speech-synthesis endpoint
pub struct SpeechClient {
    http: reqwest::Client,
    base_url: String,
}

impl SpeechClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Synthesize `text` with the given voice parameters and return the
    /// resulting audio resource locator
    pub async fn synthesize(
        &self,
        text: &str,
        options: &SpeechOptions,
    ) -> Result<SynthesizedAudio, SpeechError> {
        options.validate()?;

        let url = format!("{}/synthesize", self.base_url.trim_end_matches('/'));

        let request = SpeechRequest {
            text,
            voice: &options.voice,
            rate: options.rate,
            pitch: options.pitch,
        };

        debug!(
            "Synthesizing {} chars with voice {} (rate {}%, pitch {} Hz)",
            text.len(),
            options.voice,
            options.rate,
            options.pitch
        );

        let response = self.http.post(&url).json(&request).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let message = response.text().await.unwrap_or_default();
            return Err(SpeechError::Endpoint { status, message });
        }

        let audio: SynthesizedAudio = response.json().await?;

        info!("Synthesized audio available at {}", audio.url);

        Ok(audio)
    }
}
