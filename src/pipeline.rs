use anyhow::{Context, Result};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::chat::ChatClient;
use crate::recorder::AudioBlob;
use crate::speech::{voices, SpeechClient, SpeechOptions};

/// Outcome of one voice exchange: the reply text to caption and the
/// synthesized audio resource to play
#[derive(Debug, Clone, Serialize)]
pub struct ExchangeResult {
    pub conversation_id: String,
    pub caption: String,
    pub audio_url: String,
}

/// Orchestrates one exchange: recorded utterance in, caption and playable
/// audio URL out. Owns the conversation identifier threading successive
/// exchanges into one chat.
pub struct VoicePipeline {
    chat: ChatClient,
    speech: SpeechClient,
    conversation_id: RwLock<String>,
}

impl VoicePipeline {
    pub fn new(chat: ChatClient, speech: SpeechClient) -> Self {
        Self {
            chat,
            speech,
            conversation_id: RwLock::new(new_conversation_id()),
        }
    }

    pub async fn conversation_id(&self) -> String {
        self.conversation_id.read().await.clone()
    }

    /// Rotate the conversation id, starting a fresh chat
    pub async fn new_conversation(&self) -> String {
        let id = new_conversation_id();
        *self.conversation_id.write().await = id.clone();
        info!("New conversation: {}", id);
        id
    }

    /// Run one full exchange for a recorded utterance
    pub async fn run_exchange(
        &self,
        blob: &AudioBlob,
        options: &SpeechOptions,
    ) -> Result<ExchangeResult> {
        let conversation_id = self.conversation_id().await;

        if !voices::is_known(&options.voice) {
            warn!("Voice {:?} is not in the known catalog", options.voice);
        }

        let caption = self
            .chat
            .complete(&conversation_id, blob)
            .await
            .context("Failed to process audio")?;

        let audio = self
            .speech
            .synthesize(&caption, options)
            .await
            .context("Failed to process audio")?;

        Ok(ExchangeResult {
            conversation_id,
            caption,
            audio_url: audio.url,
        })
    }
}

/// Short random token identifying a conversation
fn new_conversation_id() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    id[..8].to_string()
}
