//! Audio output device handling.
//!
//! Opens the configured output device with cpal and runs the transport in
//! the device callback. Every frame played is also pushed into the analysis
//! tap, which is how the visualizer listens to playback.

use super::transport::SharedTransport;
use crate::analysis::SampleTap;
use anyhow::{anyhow, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, SizedSample};

#[cfg(target_os = "linux")]
use std::fs::OpenOptions;
#[cfg(target_os = "linux")]
use std::os::unix::io::AsRawFd;

/// A running output stream. Dropping it stops the audio.
pub struct AudioOutput {
    /// Kept alive for as long as playback should be audible
    _stream: cpal::Stream,
    device_name: String,
}

impl AudioOutput {
    /// Opens an output device and starts its stream.
    ///
    /// # Arguments
    /// * `device_spec` - "default", a device index, or a device name
    /// * `transport` - Shared play state read by the callback
    /// * `tap` - Receives the mono mix of everything played
    ///
    /// # Errors
    /// - If no matching output device exists
    /// - If the device reports an unsupported sample format
    /// - If the stream cannot be built or started
    pub fn open(device_spec: &str, transport: SharedTransport, tap: SampleTap) -> Result<Self> {
        let device = suppress_alsa_warnings(|| {
            let host = cpal::default_host();

            if device_spec == "default" {
                host.default_output_device()
                    .ok_or_else(|| anyhow!("No audio output device available"))
            } else {
                find_output_device(&host, device_spec)
            }
        })?;

        let device_name = device
            .name()
            .unwrap_or_else(|_| "Unknown device".to_string());
        let device_config = device.default_output_config()?;
        let sample_rate = device_config.sample_rate().0;
        let channels = device_config.channels();

        tracing::info!(
            "Output device: {} ({}Hz, {} channels, {:?})",
            device_name,
            sample_rate,
            channels,
            device_config.sample_format()
        );

        let sample_format = device_config.sample_format();
        let config: cpal::StreamConfig = device_config.into();

        let stream = match sample_format {
            cpal::SampleFormat::F32 => build_stream::<f32>(&device, &config, transport, tap)?,
            cpal::SampleFormat::I16 => build_stream::<i16>(&device, &config, transport, tap)?,
            cpal::SampleFormat::U16 => build_stream::<u16>(&device, &config, transport, tap)?,
            other => return Err(anyhow!("Unsupported output sample format: {other:?}")),
        };

        stream.play()?;
        tracing::debug!("Output stream started");

        Ok(Self {
            _stream: stream,
            device_name,
        })
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    transport: SharedTransport,
    tap: SampleTap,
) -> Result<cpal::Stream>
where
    T: SizedSample + FromSample<f32>,
{
    let channels = config.channels as usize;
    let device_rate = config.sample_rate.0;
    let mut scratch: Vec<f32> = Vec::new();
    let mut mono: Vec<f32> = Vec::new();

    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            scratch.resize(data.len(), 0.0);
            transport
                .lock()
                .unwrap()
                .render(&mut scratch, channels, device_rate, &tap, &mut mono);

            for (out, &value) in data.iter_mut().zip(scratch.iter()) {
                *out = T::from_sample(value);
            }
        },
        |err| {
            tracing::error!("Audio stream error: {}", err);
        },
        None,
    )?;

    Ok(stream)
}

/// Finds an output device by numeric index or exact name.
///
/// # Errors
/// - If devices cannot be enumerated
/// - If nothing matches `device_spec`
fn find_output_device(host: &cpal::Host, device_spec: &str) -> Result<cpal::Device> {
    let mut devices = host
        .output_devices()
        .map_err(|e| anyhow!("Failed to enumerate devices: {e}"))?;

    if let Ok(index) = device_spec.parse::<usize>() {
        let devices: Vec<_> = devices.collect();
        let count = devices.len();
        return devices.into_iter().nth(index).ok_or_else(|| {
            anyhow!(
                "Device index {} is out of range (0-{})",
                index,
                count.saturating_sub(1)
            )
        });
    }

    devices
        .find(|device| device.name().is_ok_and(|name| name == device_spec))
        .ok_or_else(|| {
            anyhow!(
                "Audio output device '{device_spec}' not found. Use 'vizplay list-devices' to see available devices."
            )
        })
}

/// Temporarily redirects stderr to /dev/null while `f` runs, hiding the
/// ALSA library chatter cpal triggers during device lookup.
#[cfg(target_os = "linux")]
pub(crate) fn suppress_alsa_warnings<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    let dev_null = OpenOptions::new()
        .write(true)
        .open("/dev/null")
        .map_err(|e| anyhow!("Failed to open /dev/null: {e}"))?;

    let old_stderr = unsafe { libc::dup(libc::STDERR_FILENO) };
    if old_stderr == -1 {
        return Err(anyhow!("Failed to duplicate stderr"));
    }

    if unsafe { libc::dup2(dev_null.as_raw_fd(), libc::STDERR_FILENO) } == -1 {
        unsafe { libc::close(old_stderr) };
        return Err(anyhow!("Failed to redirect stderr"));
    }

    let result = f();

    unsafe {
        libc::dup2(old_stderr, libc::STDERR_FILENO);
        libc::close(old_stderr);
    }

    result
}

#[cfg(not(target_os = "linux"))]
pub(crate) fn suppress_alsa_warnings<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    f()
}
