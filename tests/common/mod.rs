// Shared test doubles: scripted capture devices, a manual clock, and mock
// chat/speech upstream servers.
#![allow(dead_code)]

use async_trait::async_trait;
use axum::extract::{Json, Path};
use axum::http::StatusCode;
use axum::routing::post;
use axum::Router;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

use voice_relay::{AudioChunk, CaptureDevice, CaptureDeviceFactory, CaptureError, Clock};

/// Capture device driven entirely by the test: `immediate` chunks are
/// delivered right after start, `buffered` ones are flushed during the
/// (buffered) stop, mirroring a device that still holds data when told to
/// stop.
pub struct ScriptedDevice {
    immediate: Vec<Vec<u8>>,
    buffered: Vec<Vec<u8>>,
    mime: Option<String>,
    fail_start: Option<CaptureError>,
    fail_stop: bool,
    tx: Option<mpsc::Sender<AudioChunk>>,
}

impl ScriptedDevice {
    pub fn new() -> Self {
        Self {
            immediate: Vec::new(),
            buffered: Vec::new(),
            mime: None,
            fail_start: None,
            fail_stop: false,
            tx: None,
        }
    }

    pub fn with_immediate(mut self, chunks: &[&[u8]]) -> Self {
        self.immediate = chunks.iter().map(|c| c.to_vec()).collect();
        self
    }

    pub fn with_buffered(mut self, chunks: &[&[u8]]) -> Self {
        self.buffered = chunks.iter().map(|c| c.to_vec()).collect();
        self
    }

    pub fn with_mime(mut self, mime: &str) -> Self {
        self.mime = Some(mime.to_string());
        self
    }

    pub fn failing_start(err: CaptureError) -> Self {
        Self {
            fail_start: Some(err),
            ..Self::new()
        }
    }

    pub fn failing_stop(mut self) -> Self {
        self.fail_stop = true;
        self
    }
}

#[async_trait]
impl CaptureDevice for ScriptedDevice {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioChunk>, CaptureError> {
        if let Some(err) = self.fail_start.take() {
            return Err(err);
        }

        let (tx, rx) = mpsc::channel(64);
        let mut timestamp_ms = 0;
        for data in self.immediate.drain(..) {
            tx.send(AudioChunk { data, timestamp_ms })
                .await
                .expect("chunk receiver alive");
            timestamp_ms += 100;
        }

        self.tx = Some(tx);
        Ok(rx)
    }

    async fn stop(&mut self) -> Result<(), CaptureError> {
        if self.fail_stop {
            return Err(CaptureError::Device(anyhow::anyhow!("injected stop failure")));
        }

        if let Some(tx) = self.tx.take() {
            let mut timestamp_ms = 1_000;
            for data in self.buffered.drain(..) {
                tx.send(AudioChunk { data, timestamp_ms })
                    .await
                    .expect("chunk receiver alive");
                timestamp_ms += 100;
            }
        }

        Ok(())
    }

    fn mime_type(&self) -> Option<String> {
        self.mime.clone()
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Hands out scripted devices in order, one per recording session
#[derive(Clone)]
pub struct ScriptedFactory {
    devices: Arc<Mutex<VecDeque<ScriptedDevice>>>,
    created: Arc<AtomicUsize>,
}

impl ScriptedFactory {
    pub fn new(devices: Vec<ScriptedDevice>) -> Self {
        Self {
            devices: Arc::new(Mutex::new(devices.into())),
            created: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// How many devices the recorder has acquired so far
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

impl CaptureDeviceFactory for ScriptedFactory {
    fn create(&self) -> Box<dyn CaptureDevice> {
        self.created.fetch_add(1, Ordering::SeqCst);
        let device = self
            .devices
            .lock()
            .unwrap()
            .pop_front()
            .expect("no scripted device left");
        Box::new(device)
    }
}

/// Clock advanced explicitly by the test
pub struct ManualClock {
    now: Mutex<Instant>,
}

impl ManualClock {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            now: Mutex::new(Instant::now()),
        })
    }

    pub fn advance(&self, delta: Duration) {
        *self.now.lock().unwrap() += delta;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap()
    }
}

/// Mock chat + speech endpoints, with every received request body captured
pub struct MockUpstreams {
    pub chat_url: String,
    pub speech_url: String,
    pub chat_requests: Arc<Mutex<Vec<Value>>>,
    pub speech_requests: Arc<Mutex<Vec<Value>>>,
}

pub async fn spawn_upstreams(reply_text: &str, audio_url: &str) -> MockUpstreams {
    let chat_requests: Arc<Mutex<Vec<Value>>> = Arc::new(Mutex::new(Vec::new()));
    let speech_requests: Arc<Mutex<Vec<Value>>> = Arc::new(Mutex::new(Vec::new()));

    let chat_log = Arc::clone(&chat_requests);
    let reply = reply_text.to_string();
    let chat_app = Router::new().route(
        "/api/v1/prediction/:chatflow_id",
        post(
            move |Path(chatflow_id): Path<String>, Json(body): Json<Value>| {
                let chat_log = Arc::clone(&chat_log);
                let reply = reply.clone();
                async move {
                    chat_log
                        .lock()
                        .unwrap()
                        .push(json!({ "chatflow_id": chatflow_id, "body": body }));
                    Json(json!({ "text": reply }))
                }
            },
        ),
    );

    let speech_log = Arc::clone(&speech_requests);
    let url = audio_url.to_string();
    let speech_app = Router::new().route(
        "/synthesize",
        post(move |Json(body): Json<Value>| {
            let speech_log = Arc::clone(&speech_log);
            let url = url.clone();
            async move {
                speech_log.lock().unwrap().push(body);
                Json(json!({ "url": url }))
            }
        }),
    );

    MockUpstreams {
        chat_url: serve(chat_app).await,
        speech_url: serve(speech_app).await,
        chat_requests,
        speech_requests,
    }
}

/// Chat endpoint that always fails
pub async fn spawn_failing_chat() -> String {
    let app = Router::new().route(
        "/api/v1/prediction/:chatflow_id",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "flow exploded") }),
    );
    serve(app).await
}

/// Bind a router on an ephemeral port and return its base URL
pub async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock server");
    let addr = listener.local_addr().expect("local addr");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("mock server");
    });

    format!("http://{}", addr)
}
