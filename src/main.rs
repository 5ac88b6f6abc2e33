use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::info;

use voice_relay::{
    create_router, AppState, AudioRecorder, ChatClient, Config, SpeechClient, VoicePipeline,
};

#[derive(Debug, Parser)]
#[command(name = "voice-relay", about = "Voice chat relay: record, ask, speak back")]
struct Cli {
    /// Path to the configuration file, without extension
    #[arg(long, default_value = "config/voice-relay")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)
        .with_context(|| format!("Failed to load config {}", cli.config))?;

    info!("voice-relay v0.1.0");
    info!("Loaded config: {}", cfg.service.name);
    info!(
        "Chat endpoint: {} (chatflow {})",
        cfg.chat.base_url, cfg.chat.chatflow_id
    );
    info!("Speech endpoint: {} (voice {})", cfg.speech.base_url, cfg.speech.voice);

    let recorder = Arc::new(AudioRecorder::for_microphone());
    let chat = ChatClient::new(cfg.chat.base_url.clone(), cfg.chat.chatflow_id.clone());
    let speech = SpeechClient::new(cfg.speech.base_url.clone());
    let pipeline = Arc::new(VoicePipeline::new(chat, speech));

    let state = AppState {
        recorder,
        pipeline,
        speech_defaults: cfg.speech.options(),
        captures_dir: cfg.audio.captures_dir.clone().map(Into::into),
    };

    let router = create_router(state);

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("Listening on {}", addr);

    axum::serve(listener, router)
        .await
        .context("HTTP server failed")?;

    Ok(())
}
