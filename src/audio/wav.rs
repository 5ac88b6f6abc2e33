use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::recorder::AudioBlob;

/// Parse sample rate and channel count out of an `audio/L16` MIME type,
/// e.g. `audio/L16;rate=44100;channels=1`. Channels default to 1 when the
/// parameter is absent. Returns `None` for any other content type.
pub fn l16_params(mime: &str) -> Option<(u32, u16)> {
    let mut parts = mime.split(';').map(str::trim);

    if !parts.next()?.eq_ignore_ascii_case("audio/l16") {
        return None;
    }

    let mut rate: Option<u32> = None;
    let mut channels: u16 = 1;

    for part in parts {
        match part.split_once('=') {
            Some((key, value)) if key.eq_ignore_ascii_case("rate") => {
                rate = value.parse().ok();
            }
            Some((key, value)) if key.eq_ignore_ascii_case("channels") => {
                channels = value.parse().ok()?;
            }
            _ => {}
        }
    }

    rate.map(|r| (r, channels))
}

/// Write an utterance blob to `dir` as a WAV file.
///
/// Only raw PCM blobs (`audio/L16`) can be containerized; anything else is
/// skipped with `Ok(None)`. Returns the path of the written file otherwise.
pub fn archive_blob(dir: &Path, blob: &AudioBlob) -> Result<Option<PathBuf>> {
    let Some((sample_rate, channels)) = l16_params(&blob.mime_type) else {
        return Ok(None);
    };

    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create capture directory {}", dir.display()))?;

    let stamp = chrono::Utc::now().format("%Y%m%d-%H%M%S%.3f");
    let path = dir.join(format!("utterance-{}.wav", stamp));

    write_pcm_wav(&path, &blob.data, sample_rate, channels)?;

    info!(
        "Utterance archived: {} ({} bytes at {} Hz)",
        path.display(),
        blob.data.len(),
        sample_rate
    );

    Ok(Some(path))
}

/// Write little-endian PCM16 bytes to disk as a WAV file
pub fn write_pcm_wav(path: &Path, pcm: &[u8], sample_rate: u32, channels: u16) -> Result<()> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)
        .with_context(|| format!("Failed to create WAV file {}", path.display()))?;

    for pair in pcm.chunks_exact(2) {
        let sample = i16::from_le_bytes([pair[0], pair[1]]);
        writer.write_sample(sample).context("Failed to write sample to WAV")?;
    }

    writer.finalize().context("Failed to finalize WAV file")?;

    Ok(())
}
