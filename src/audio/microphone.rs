use anyhow::anyhow;
use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use super::capture::{AudioChunk, CaptureDevice, CaptureDeviceFactory, CaptureError};

/// Chunk cadence for the microphone backend (~100ms of audio per chunk)
const CHUNK_INTERVAL_MS: u64 = 100;

/// Capture device backed by the system's default microphone.
///
/// Samples are captured at the device's native rate, converted to mono i16,
/// and emitted as little-endian PCM chunks. The negotiated MIME type is
/// `audio/L16;rate=<hz>;channels=1`, so a concatenation of every chunk is
/// itself a valid PCM stream.
///
/// The cpal stream is not `Send`, so it lives on a dedicated thread for the
/// duration of the session; `stop` flags the thread down and waits for it to
/// flush and exit before resolving.
pub struct MicrophoneDevice {
    capturing: Arc<AtomicBool>,
    mime_type: Option<String>,
    done_rx: Option<oneshot::Receiver<()>>,
}

impl MicrophoneDevice {
    pub fn new() -> Self {
        Self {
            capturing: Arc::new(AtomicBool::new(false)),
            mime_type: None,
            done_rx: None,
        }
    }
}

impl Default for MicrophoneDevice {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CaptureDevice for MicrophoneDevice {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioChunk>, CaptureError> {
        if self.done_rx.is_some() {
            return Err(CaptureError::Device(anyhow!("microphone already started")));
        }

        let (chunk_tx, chunk_rx) = mpsc::channel(64);
        let (ready_tx, ready_rx) = oneshot::channel();
        let (done_tx, done_rx) = oneshot::channel();

        self.capturing.store(true, Ordering::SeqCst);
        let capturing = Arc::clone(&self.capturing);

        // The capture thread owns the cpal stream until the session ends
        std::thread::spawn(move || run_capture(chunk_tx, capturing, ready_tx, done_tx));

        let sample_rate = ready_rx
            .await
            .map_err(|_| CaptureError::Device(anyhow!("capture thread exited before reporting readiness")))??;

        self.mime_type = Some(format!("audio/L16;rate={};channels=1", sample_rate));
        self.done_rx = Some(done_rx);

        info!("Microphone capturing at {} Hz", sample_rate);

        Ok(chunk_rx)
    }

    async fn stop(&mut self) -> Result<(), CaptureError> {
        self.capturing.store(false, Ordering::SeqCst);

        match self.done_rx.take() {
            Some(done) => done
                .await
                .map_err(|_| CaptureError::Device(anyhow!("capture thread died before confirming stop"))),
            None => Ok(()),
        }
    }

    fn mime_type(&self) -> Option<String> {
        self.mime_type.clone()
    }

    fn name(&self) -> &str {
        "microphone"
    }
}

/// Factory producing one `MicrophoneDevice` per recording session
pub struct MicrophoneFactory;

impl CaptureDeviceFactory for MicrophoneFactory {
    fn create(&self) -> Box<dyn CaptureDevice> {
        Box::new(MicrophoneDevice::new())
    }
}

/// Capture loop running on the dedicated audio thread.
///
/// Builds the input stream, reports readiness (or the acquisition error),
/// then drains the sample buffer into ~100ms chunks until flagged down.
/// Closing the chunk sender is the buffered-stop signal the recorder waits on.
fn run_capture(
    chunk_tx: mpsc::Sender<AudioChunk>,
    capturing: Arc<AtomicBool>,
    ready_tx: oneshot::Sender<Result<u32, CaptureError>>,
    done_tx: oneshot::Sender<()>,
) {
    let acquired = acquire_stream();

    let (stream, sample_rate, samples) = match acquired {
        Ok(parts) => parts,
        Err(e) => {
            let _ = ready_tx.send(Err(e));
            let _ = done_tx.send(());
            return;
        }
    };

    let _ = ready_tx.send(Ok(sample_rate));

    let chunk_samples = (sample_rate as u64 * CHUNK_INTERVAL_MS / 1000) as usize;
    let mut sent_samples: u64 = 0;

    while capturing.load(Ordering::SeqCst) {
        std::thread::sleep(std::time::Duration::from_millis(10));

        let drained = {
            let mut buf = samples.lock().unwrap();
            if buf.len() >= chunk_samples {
                std::mem::take(&mut *buf)
            } else {
                Vec::new()
            }
        };

        if !drained.is_empty() {
            sent_samples = send_chunk(&chunk_tx, drained, sent_samples, sample_rate);
        }
    }

    // Tear the stream down before the final drain so no samples land mid-flush
    drop(stream);

    let remaining = std::mem::take(&mut *samples.lock().unwrap());
    if !remaining.is_empty() {
        send_chunk(&chunk_tx, remaining, sent_samples, sample_rate);
    }

    debug!("Capture thread exiting");

    // Dropping the sender closes the recorder's chunk channel
    drop(chunk_tx);
    let _ = done_tx.send(());
}

type AcquiredStream = (cpal::Stream, u32, Arc<Mutex<Vec<i16>>>);

fn acquire_stream() -> Result<AcquiredStream, CaptureError> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| CaptureError::Unsupported("no audio input device available".to_string()))?;

    let device_name = device.name().unwrap_or_else(|_| "unknown device".to_string());
    let config = device
        .default_input_config()
        .map_err(|e| CaptureError::PermissionDenied(e.to_string()))?;

    let sample_rate = config.sample_rate().0;
    let channels = config.channels() as usize;
    let samples: Arc<Mutex<Vec<i16>>> = Arc::new(Mutex::new(Vec::new()));

    debug!(
        "Input device {}: {} Hz, {} channels, {:?}",
        device_name,
        sample_rate,
        channels,
        config.sample_format()
    );

    let stream = match config.sample_format() {
        cpal::SampleFormat::F32 => {
            let samples = Arc::clone(&samples);
            device.build_input_stream(
                &config.into(),
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    push_f32(data, channels, &samples);
                },
                |err| error!("Audio input error: {}", err),
                None,
            )
        }
        cpal::SampleFormat::I16 => {
            let samples = Arc::clone(&samples);
            device.build_input_stream(
                &config.into(),
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    push_i16(data, channels, &samples);
                },
                |err| error!("Audio input error: {}", err),
                None,
            )
        }
        other => {
            return Err(CaptureError::Unsupported(format!(
                "unsupported sample format {:?}",
                other
            )))
        }
    }
    .map_err(|e| CaptureError::PermissionDenied(e.to_string()))?;

    stream
        .play()
        .map_err(|e| CaptureError::PermissionDenied(e.to_string()))?;

    Ok((stream, sample_rate, samples))
}

/// Convert captured f32 samples to mono i16
fn push_f32(data: &[f32], channels: usize, samples: &Arc<Mutex<Vec<i16>>>) {
    let mut samples = samples.lock().unwrap();
    if channels > 1 {
        for frame in data.chunks(channels) {
            let mono = frame.iter().sum::<f32>() / channels as f32;
            samples.push((mono.clamp(-1.0, 1.0) * i16::MAX as f32) as i16);
        }
    } else {
        samples.extend(data.iter().map(|s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16));
    }
}

/// Average interleaved i16 channels down to mono
fn push_i16(data: &[i16], channels: usize, samples: &Arc<Mutex<Vec<i16>>>) {
    let mut samples = samples.lock().unwrap();
    if channels > 1 {
        for frame in data.chunks(channels) {
            let sum: i32 = frame.iter().map(|&s| s as i32).sum();
            samples.push((sum / channels as i32) as i16);
        }
    } else {
        samples.extend_from_slice(data);
    }
}

fn send_chunk(
    tx: &mpsc::Sender<AudioChunk>,
    samples: Vec<i16>,
    sent_samples: u64,
    sample_rate: u32,
) -> u64 {
    let timestamp_ms = sent_samples * 1000 / sample_rate as u64;
    let count = samples.len() as u64;
    let data: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();

    if tx.blocking_send(AudioChunk { data, timestamp_ms }).is_err() {
        warn!("Chunk receiver dropped, discarding audio");
    }

    sent_samples + count
}
