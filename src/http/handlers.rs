use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use super::state::AppState;
use crate::audio::wav;
use crate::pipeline::ExchangeResult;
use crate::recorder::RecorderError;
use crate::speech::voices;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct StartRecordingResponse {
    pub status: String,
    pub message: String,
}

/// Optional per-exchange overrides of the configured voice parameters
#[derive(Debug, Default, Deserialize)]
pub struct StopRecordingRequest {
    pub voice: Option<String>,
    pub rate: Option<i32>,
    pub pitch: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct StopRecordingResponse {
    pub conversation_id: String,
    pub caption: String,
    pub audio_url: String,
    pub duration_ms: Option<u64>,
    pub audio_bytes: usize,
}

#[derive(Debug, Serialize)]
pub struct NewConversationResponse {
    pub conversation_id: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn recorder_error_status(err: &RecorderError) -> StatusCode {
    match err {
        RecorderError::AlreadyRecording | RecorderError::NoActiveRecording => StatusCode::CONFLICT,
        RecorderError::PermissionDenied(_) => StatusCode::FORBIDDEN,
        RecorderError::Unsupported(_) => StatusCode::NOT_IMPLEMENTED,
        RecorderError::StopFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /relay/record/start
/// Begin a recording session (the press gesture)
pub async fn start_recording(State(state): State<AppState>) -> impl IntoResponse {
    match state.recorder.start_recording().await {
        Ok(()) => (
            StatusCode::OK,
            Json(StartRecordingResponse {
                status: "recording".to_string(),
                message: "Recording started".to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to start recording: {}", e);
            (
                recorder_error_status(&e),
                Json(ErrorResponse { error: e.to_string() }),
            )
                .into_response()
        }
    }
}

/// POST /relay/record/stop
/// Stop the session and run the exchange (the release gesture)
pub async fn stop_recording(
    State(state): State<AppState>,
    body: Option<Json<StopRecordingRequest>>,
) -> impl IntoResponse {
    let overrides = body.map(|Json(b)| b).unwrap_or_default();

    let mut options = state.speech_defaults.clone();
    if let Some(voice) = overrides.voice {
        options.voice = voice;
    }
    if let Some(rate) = overrides.rate {
        options.rate = rate;
    }
    if let Some(pitch) = overrides.pitch {
        options.pitch = pitch;
    }

    if let Err(e) = options.validate() {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorResponse { error: e.to_string() }),
        )
            .into_response();
    }

    let blob = match state.recorder.stop_recording().await {
        Ok(blob) => blob,
        Err(e) => {
            error!("Failed to stop recording: {}", e);
            return (
                recorder_error_status(&e),
                Json(ErrorResponse { error: e.to_string() }),
            )
                .into_response();
        }
    };

    if let Some(dir) = &state.captures_dir {
        match wav::archive_blob(dir, &blob) {
            Ok(Some(_)) => {}
            Ok(None) => debug!("Blob format {} not archivable", blob.mime_type),
            Err(e) => warn!("Failed to archive utterance: {e:#}"),
        }
    }

    let duration_ms = state.recorder.stats().last_duration_ms;

    match state.pipeline.run_exchange(&blob, &options).await {
        Ok(ExchangeResult {
            conversation_id,
            caption,
            audio_url,
        }) => {
            info!("Exchange complete for conversation {}", conversation_id);
            (
                StatusCode::OK,
                Json(StopRecordingResponse {
                    conversation_id,
                    caption,
                    audio_url,
                    duration_ms,
                    audio_bytes: blob.data.len(),
                }),
            )
                .into_response()
        }
        Err(e) => {
            error!("Exchange failed: {:#}", e);
            (
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse {
                    error: format!("{e:#}"),
                }),
            )
                .into_response()
        }
    }
}

/// GET /relay/status
/// Current recorder state
pub async fn get_status(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.recorder.stats())).into_response()
}

/// GET /relay/voices
/// Voice catalog for the settings surface
pub async fn list_voices() -> impl IntoResponse {
    (StatusCode::OK, Json(voices::all())).into_response()
}

/// POST /relay/conversation/new
/// Rotate the conversation id
pub async fn new_conversation(State(state): State<AppState>) -> impl IntoResponse {
    let conversation_id = state.pipeline.new_conversation().await;
    (
        StatusCode::OK,
        Json(NewConversationResponse { conversation_id }),
    )
        .into_response()
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
