use base64::Engine;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::recorder::AudioBlob;

/// Upload descriptor the chat-completion endpoint expects alongside the
/// (empty) question. The `data` field is a data URL, matching what the web
/// client produced with `FileReader.readAsDataURL`.
#[derive(Debug, Clone, Serialize)]
pub struct AudioUpload {
    pub data: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub mime: String,
}

impl AudioUpload {
    pub fn from_blob(blob: &AudioBlob) -> Self {
        let payload = base64::engine::general_purpose::STANDARD.encode(&blob.data);
        Self {
            data: format!("data:{};base64,{}", blob.mime_type, payload),
            kind: "audio".to_string(),
            name: "audio.webm".to_string(),
            mime: "audio/webm".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    question: &'a str,
    #[serde(rename = "chatId")]
    chat_id: &'a str,
    uploads: Vec<AudioUpload>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    text: String,
}

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("chat completion request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("chat completion endpoint returned {status}: {message}")]
    Endpoint { status: StatusCode, message: String },
}

/// Client for the chat-completion endpoint.
///
/// One utterance per request: conversation id, empty question text and a
/// single base64 audio attachment. The response carries the reply text to
/// synthesize.
pub struct ChatClient {
    http: reqwest::Client,
    base_url: String,
    chatflow_id: String,
}

impl ChatClient {
    pub fn new(base_url: impl Into<String>, chatflow_id: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            chatflow_id: chatflow_id.into(),
        }
    }

    /// Send one recorded utterance and return the reply text
    pub async fn complete(
        &self,
        conversation_id: &str,
        blob: &AudioBlob,
    ) -> Result<String, ChatError> {
        let url = format!(
            "{}/api/v1/prediction/{}",
            self.base_url.trim_end_matches('/'),
            self.chatflow_id
        );

        let request = ChatRequest {
            question: "",
            chat_id: conversation_id,
            uploads: vec![AudioUpload::from_blob(blob)],
        };

        debug!(
            "Sending {} byte utterance to chat endpoint (conversation {})",
            blob.data.len(),
            conversation_id
        );

        let response = self.http.post(&url).json(&request).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let message = response.text().await.unwrap_or_default();
            return Err(ChatError::Endpoint { status, message });
        }

        let completion: ChatCompletion = response.json().await?;

        info!("Chat reply received: {} chars", completion.text.len());

        Ok(completion.text)
    }
}
