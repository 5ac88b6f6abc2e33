use anyhow::{bail, Result};
use serde::Deserialize;

use crate::speech::{SpeechOptions, DEFAULT_VOICE};

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub chat: ChatConfig,
    pub speech: SpeechConfig,
    #[serde(default)]
    pub audio: AudioConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

/// Chat-completion endpoint settings
#[derive(Debug, Deserialize)]
pub struct ChatConfig {
    pub base_url: String,
    /// Flow identifier appended to the prediction path; required, exchanges
    /// cannot run without one
    pub chatflow_id: String,
}

/// Speech-synthesis endpoint settings and default voice parameters
#[derive(Debug, Deserialize)]
pub struct SpeechConfig {
    pub base_url: String,
    #[serde(default = "default_voice")]
    pub voice: String,
    /// Rate adjustment in percent, -50 to 50
    #[serde(default)]
    pub rate: i32,
    /// Pitch offset in Hz, -20 to 20
    #[serde(default)]
    pub pitch: i32,
}

fn default_voice() -> String {
    DEFAULT_VOICE.to_string()
}

impl SpeechConfig {
    pub fn options(&self) -> SpeechOptions {
        SpeechOptions {
            voice: self.voice.clone(),
            rate: self.rate,
            pitch: self.pitch,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AudioConfig {
    /// When set, every recorded utterance is additionally archived here as WAV
    #[serde(default)]
    pub captures_dir: Option<String>,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        let cfg: Config = settings.try_deserialize()?;
        cfg.validate()?;

        Ok(cfg)
    }

    fn validate(&self) -> Result<()> {
        if self.chat.chatflow_id.trim().is_empty() {
            bail!("no chatflow id configured, set chat.chatflow_id in the config file");
        }

        if let Err(e) = self.speech.options().validate() {
            bail!("invalid speech defaults: {e}");
        }

        Ok(())
    }
}
