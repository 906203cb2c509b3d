//! Decoding of song files into interleaved `f32` samples.

use super::ffmpeg::convert_to_wav;
use anyhow::{anyhow, Result};
use hound::{SampleFormat, WavReader};
use std::path::Path;

/// A fully decoded song held in memory.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedTrack {
    /// Interleaved samples in -1.0..=1.0
    pub samples: Vec<f32>,
    pub channels: u16,
    pub sample_rate: u32,
}

impl DecodedTrack {
    /// Number of sample frames (one sample per channel).
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels as usize
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / self.sample_rate as f64
    }

    /// Sample of `channel` at `frame`, or silence when out of range.
    pub fn sample(&self, frame: usize, channel: usize) -> f32 {
        let channels = self.channels as usize;
        if channel >= channels {
            return 0.0;
        }
        self.samples
            .get(frame * channels + channel)
            .copied()
            .unwrap_or(0.0)
    }
}

/// Decodes a song file.
///
/// WAV files are read directly; anything else goes through ffmpeg into a
/// temporary WAV that is removed afterwards.
///
/// # Errors
/// - If the file does not exist
/// - If the WAV data is malformed or uses an unsupported bit depth
/// - If ffmpeg conversion fails for non-WAV files
pub fn decode_file(path: &Path) -> Result<DecodedTrack> {
    if !path.exists() {
        return Err(anyhow!("Audio file not found: {}", path.display()));
    }

    let is_wav = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"));

    if is_wav {
        return decode_wav(path);
    }

    let temp_wav = std::env::temp_dir().join(format!("vizplay_{}.wav", std::process::id()));
    convert_to_wav(path, &temp_wav)?;
    let track = decode_wav(&temp_wav);

    if let Err(e) = std::fs::remove_file(&temp_wav) {
        tracing::debug!("Failed to remove temp file: {}", e);
    }

    track
}

/// Reads a WAV file into normalized samples.
///
/// # Errors
/// - If the file cannot be opened or parsed
/// - If the integer bit depth is above 32
fn decode_wav(path: &Path) -> Result<DecodedTrack> {
    let mut reader = WavReader::open(path)
        .map_err(|e| anyhow!("Failed to open {}: {e}", path.display()))?;
    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader.samples::<f32>().collect::<Result<_, _>>()?,
        SampleFormat::Int => {
            if spec.bits_per_sample == 0 || spec.bits_per_sample > 32 {
                return Err(anyhow!(
                    "Unsupported WAV bit depth: {}",
                    spec.bits_per_sample
                ));
            }
            let full_scale = (1u64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / full_scale))
                .collect::<Result<_, _>>()?
        }
    };

    let track = DecodedTrack {
        samples,
        channels: spec.channels,
        sample_rate: spec.sample_rate,
    };

    tracing::info!(
        "Decoded {}: {:.2}s, {} channels at {}Hz",
        path.display(),
        track.duration_secs(),
        track.channels,
        track.sample_rate
    );

    Ok(track)
}
