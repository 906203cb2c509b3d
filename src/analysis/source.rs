//! Time- and frequency-domain analysis over the tapped output signal.
//!
//! Mirrors the behaviour of a standard audio-analysis node: a Blackman
//! windowed forward FFT with temporal smoothing, mapped onto a decibel range
//! and quantized to bytes.

use super::buffer::{AnalysisBuffer, SampleTap, MAX_TAP_SAMPLES};
use anyhow::{anyhow, Result};
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

const MIN_FFT_SIZE: usize = 32;

/// Blackman window alpha.
const BLACKMAN_ALPHA: f32 = 0.16;

/// Analysis parameters. Defaults match a freshly created analysis node with
/// the transform size the player uses.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalyserSettings {
    /// Transform resolution; power of two in 32..=32768
    pub fft_size: usize,
    /// Weight of the previous spectrum when smoothing (0.0..=1.0)
    pub smoothing_time_constant: f32,
    /// Decibel value mapped to byte 0
    pub min_decibels: f32,
    /// Decibel value mapped to byte 255
    pub max_decibels: f32,
}

impl Default for AnalyserSettings {
    fn default() -> Self {
        Self {
            fft_size: 256,
            smoothing_time_constant: 0.8,
            min_decibels: -100.0,
            max_decibels: -30.0,
        }
    }
}

impl AnalyserSettings {
    /// Number of frequency bins, which is also the length of both buffers.
    pub fn frequency_bin_count(&self) -> usize {
        self.fft_size / 2
    }

    /// Checks the settings are usable for analysis.
    ///
    /// # Errors
    /// - If the transform size is not a power of two in 32..=32768
    /// - If the smoothing constant is outside 0.0..=1.0
    /// - If the decibel range is empty or inverted
    pub fn validate(&self) -> Result<()> {
        if !self.fft_size.is_power_of_two()
            || !(MIN_FFT_SIZE..=MAX_TAP_SAMPLES).contains(&self.fft_size)
        {
            return Err(anyhow!(
                "Invalid transform size {}: must be a power of two between {} and {}",
                self.fft_size,
                MIN_FFT_SIZE,
                MAX_TAP_SAMPLES
            ));
        }

        if !(0.0..=1.0).contains(&self.smoothing_time_constant) {
            return Err(anyhow!(
                "Invalid smoothing time constant {}: must be between 0 and 1",
                self.smoothing_time_constant
            ));
        }

        if self.min_decibels >= self.max_decibels {
            return Err(anyhow!(
                "Invalid decibel range: min ({}) must be below max ({})",
                self.min_decibels,
                self.max_decibels
            ));
        }

        Ok(())
    }
}

/// Periodically sampled view of the signal reaching the output device.
///
/// Both refresh operations overwrite a buffer owned by the source and hand
/// back a borrow of it; nothing is allocated per call.
pub struct AudioAnalysisSource {
    settings: AnalyserSettings,
    tap: SampleTap,
    fft: Arc<dyn Fft<f32>>,
    blackman: Vec<f32>,
    window: Vec<f32>,
    spectrum: Vec<Complex<f32>>,
    smoothed: Vec<f32>,
    time_domain: AnalysisBuffer,
    frequency_domain: AnalysisBuffer,
}

impl AudioAnalysisSource {
    /// Creates a source with the given transform size and default smoothing
    /// and decibel range.
    ///
    /// # Errors
    /// - If `transform_size` is not a supported power of two
    #[allow(dead_code)]
    pub fn configure(transform_size: usize, tap: SampleTap) -> Result<Self> {
        Self::with_settings(
            AnalyserSettings {
                fft_size: transform_size,
                ..AnalyserSettings::default()
            },
            tap,
        )
    }

    /// Creates a source from full analysis settings.
    ///
    /// # Errors
    /// - If the settings fail validation
    pub fn with_settings(settings: AnalyserSettings, tap: SampleTap) -> Result<Self> {
        settings.validate()?;

        let fft_size = settings.fft_size;
        let bins = settings.frequency_bin_count();
        let fft = FftPlanner::new().plan_fft_forward(fft_size);

        tracing::debug!(
            "Analysis source configured: fft_size={}, bins={}, smoothing={}, range={}..{} dB",
            fft_size,
            bins,
            settings.smoothing_time_constant,
            settings.min_decibels,
            settings.max_decibels
        );

        Ok(Self {
            settings,
            tap,
            fft,
            blackman: blackman_window(fft_size),
            window: vec![0.0; fft_size],
            spectrum: vec![Complex::new(0.0, 0.0); fft_size],
            smoothed: vec![0.0; bins],
            time_domain: AnalysisBuffer::new(bins, 128),
            frequency_domain: AnalysisBuffer::new(bins, 0),
        })
    }

    /// Takes an oscilloscope snapshot of the current analysis window.
    ///
    /// Each sample `x` becomes `floor(128 * (1 + x))` clamped to a byte, so
    /// silence reads as 128.
    pub fn refresh_time_domain(&mut self) -> &AnalysisBuffer {
        self.tap.latest(&mut self.window);

        for (byte, &sample) in self
            .time_domain
            .as_mut_slice()
            .iter_mut()
            .zip(self.window.iter())
        {
            *byte = (128.0 * (1.0 + sample)).floor().clamp(0.0, 255.0) as u8;
        }

        &self.time_domain
    }

    /// Computes the smoothed per-bin magnitudes of the current analysis
    /// window, scaled from the decibel range onto 0..=255.
    pub fn refresh_frequency_domain(&mut self) -> &AnalysisBuffer {
        self.tap.latest(&mut self.window);

        for ((slot, &sample), &weight) in self
            .spectrum
            .iter_mut()
            .zip(self.window.iter())
            .zip(self.blackman.iter())
        {
            *slot = Complex::new(sample * weight, 0.0);
        }

        self.fft.process(&mut self.spectrum);

        let fft_size = self.settings.fft_size as f32;
        let tau = self.settings.smoothing_time_constant;
        let min_db = self.settings.min_decibels;
        let scale = 255.0 / (self.settings.max_decibels - min_db);

        for ((byte, previous), bin) in self
            .frequency_domain
            .as_mut_slice()
            .iter_mut()
            .zip(self.smoothed.iter_mut())
            .zip(self.spectrum.iter())
        {
            let magnitude = bin.norm() / fft_size;
            let mut smoothed = tau * *previous + (1.0 - tau) * magnitude;
            if !smoothed.is_finite() {
                smoothed = 0.0;
            }
            *previous = smoothed;

            // log10(0) is -inf, which clamps to 0 below
            let db = 20.0 * smoothed.log10();
            *byte = (scale * (db - min_db)).floor().clamp(0.0, 255.0) as u8;
        }

        &self.frequency_domain
    }
}

fn blackman_window(size: usize) -> Vec<f32> {
    let a0 = (1.0 - BLACKMAN_ALPHA) / 2.0;
    let a1 = 0.5;
    let a2 = BLACKMAN_ALPHA / 2.0;
    let n = size as f32;

    (0..size)
        .map(|i| {
            let phase = 2.0 * std::f32::consts::PI * i as f32 / n;
            a0 - a1 * phase.cos() + a2 * (2.0 * phase).cos()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(bin: usize, fft_size: usize, amplitude: f32) -> Vec<f32> {
        (0..fft_size)
            .map(|n| {
                amplitude
                    * (2.0 * std::f32::consts::PI * bin as f32 * n as f32 / fft_size as f32).sin()
            })
            .collect()
    }

    #[test]
    fn test_configure_rejects_unsupported_sizes() {
        assert!(AudioAnalysisSource::configure(300, SampleTap::new()).is_err());
        assert!(AudioAnalysisSource::configure(16, SampleTap::new()).is_err());
        assert!(AudioAnalysisSource::configure(65536, SampleTap::new()).is_err());
        assert!(AudioAnalysisSource::configure(0, SampleTap::new()).is_err());
        assert!(AudioAnalysisSource::configure(256, SampleTap::new()).is_ok());
    }

    #[test]
    fn test_settings_validation() {
        let inverted = AnalyserSettings {
            min_decibels: -20.0,
            max_decibels: -30.0,
            ..AnalyserSettings::default()
        };
        assert!(inverted.validate().is_err());

        let smoothing = AnalyserSettings {
            smoothing_time_constant: 1.5,
            ..AnalyserSettings::default()
        };
        assert!(smoothing.validate().is_err());
    }

    #[test]
    fn test_buffers_have_half_transform_length() {
        for fft_size in [32, 64, 256, 2048] {
            let tap = SampleTap::new();
            tap.push(&sine(3, fft_size, 0.9));
            let mut source = AudioAnalysisSource::configure(fft_size, tap).unwrap();

            assert_eq!(source.refresh_time_domain().len(), fft_size / 2);
            assert_eq!(source.refresh_frequency_domain().len(), fft_size / 2);
        }
    }

    #[test]
    fn test_silence_reads_as_center_and_zero() {
        let mut source = AudioAnalysisSource::configure(256, SampleTap::new()).unwrap();

        assert!(source.refresh_time_domain().iter().all(|&b| b == 128));
        assert!(source.refresh_frequency_domain().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_time_domain_quantization() {
        let tap = SampleTap::new();
        let mut samples = vec![0.0f32; 32];
        samples[0] = -1.0;
        samples[1] = 1.0;
        samples[2] = 0.5;
        samples[3] = -0.5;
        tap.push(&samples);

        let mut source = AudioAnalysisSource::configure(32, tap).unwrap();
        let time = source.refresh_time_domain();
        assert_eq!(time[0], 0);
        assert_eq!(time[1], 255);
        assert_eq!(time[2], 192);
        assert_eq!(time[3], 64);
        assert_eq!(time[4], 128);
    }

    #[test]
    fn test_sine_peaks_at_its_bin() {
        let tap = SampleTap::new();
        tap.push(&sine(16, 256, 0.001));

        let settings = AnalyserSettings {
            smoothing_time_constant: 0.0,
            ..AnalyserSettings::default()
        };
        let mut source = AudioAnalysisSource::with_settings(settings, tap).unwrap();
        let freq = source.refresh_frequency_domain();

        let (peak, &value) = freq
            .iter()
            .enumerate()
            .max_by_key(|&(_, b)| *b)
            .unwrap();
        assert_eq!(peak, 16);
        assert!(value > 0);
        assert_eq!(freq[100], 0);
    }

    #[test]
    fn test_smoothing_carries_previous_spectrum() {
        let tap = SampleTap::new();
        tap.push(&sine(8, 256, 0.001));
        let mut source = AudioAnalysisSource::configure(256, tap.clone()).unwrap();

        let first = source.refresh_frequency_domain()[8];
        let second = source.refresh_frequency_domain()[8];
        assert!(second > first);

        tap.clear();
        let decayed = source.refresh_frequency_domain()[8];
        assert!(decayed > 0);
        assert!(decayed < second);
    }
}
