//! Playback position and output rendering shared with the audio thread.

use super::decode::DecodedTrack;
use crate::analysis::SampleTap;
use std::sync::{Arc, Mutex};

/// Transport state guarded for the audio callback.
pub type SharedTransport = Arc<Mutex<Transport>>;

/// What is loaded, where the play head is, and how loud it plays.
#[derive(Debug)]
pub struct Transport {
    track: Option<Arc<DecodedTrack>>,
    /// Play head in track frames; fractional when resampling
    position: f64,
    playing: bool,
    volume: f32,
    finished: bool,
}

impl Transport {
    pub fn new(volume: f32) -> Self {
        Self {
            track: None,
            position: 0.0,
            playing: false,
            volume: volume.clamp(0.0, 1.0),
            finished: false,
        }
    }

    pub fn shared(volume: f32) -> SharedTransport {
        Arc::new(Mutex::new(Self::new(volume)))
    }

    /// Loads a track at its start, paused.
    pub fn load(&mut self, track: Arc<DecodedTrack>) {
        self.track = Some(track);
        self.position = 0.0;
        self.playing = false;
        self.finished = false;
    }

    /// Drops the loaded track and stops.
    pub fn unload(&mut self) {
        self.track = None;
        self.position = 0.0;
        self.playing = false;
        self.finished = false;
    }

    pub fn set_playing(&mut self, playing: bool) {
        // Restarting a track that ran to its end plays it from the top
        if playing {
            if let Some(track) = &self.track {
                if self.position >= track.frames() as f64 {
                    self.position = 0.0;
                }
            }
            self.finished = false;
        }
        self.playing = playing && self.track.is_some();
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Play head in seconds.
    pub fn position_secs(&self) -> f64 {
        match &self.track {
            Some(track) if track.sample_rate > 0 => self.position / track.sample_rate as f64,
            _ => 0.0,
        }
    }

    pub fn duration_secs(&self) -> f64 {
        self.track.as_ref().map_or(0.0, |t| t.duration_secs())
    }

    /// Moves the play head, clamped to the track.
    pub fn seek_secs(&mut self, seconds: f64) {
        if let Some(track) = &self.track {
            let frame = seconds.max(0.0) * track.sample_rate as f64;
            self.position = frame.min(track.frames() as f64);
            self.finished = false;
        }
    }

    /// Returns true once after the play head ran off the end of the track.
    pub fn take_finished(&mut self) -> bool {
        std::mem::take(&mut self.finished)
    }

    /// Fills one interleaved output buffer and feeds the tap.
    ///
    /// Resamples by nearest frame from the track rate to `device_rate` and
    /// maps output channel `c` to track channel `min(c, channels - 1)`. The
    /// mono mix of every frame that was actually played goes into `tap`;
    /// `mono` is scratch space reused between callbacks.
    pub fn render(
        &mut self,
        out: &mut [f32],
        out_channels: usize,
        device_rate: u32,
        tap: &SampleTap,
        mono: &mut Vec<f32>,
    ) {
        out.fill(0.0);
        mono.clear();

        let track = match (&self.track, self.playing) {
            (Some(track), true) if out_channels > 0 && device_rate > 0 => Arc::clone(track),
            _ => return,
        };

        let track_channels = track.channels as usize;
        let total_frames = track.frames();
        let step = track.sample_rate as f64 / device_rate as f64;

        for frame in out.chunks_exact_mut(out_channels) {
            let index = self.position as usize;
            if index >= total_frames {
                self.playing = false;
                self.finished = true;
                break;
            }

            let mut mix = 0.0;
            for (channel, slot) in frame.iter_mut().enumerate() {
                let source_channel = channel.min(track_channels.saturating_sub(1));
                let value = track.sample(index, source_channel) * self.volume;
                *slot = value;
                mix += value;
            }
            mono.push(mix / out_channels as f32);

            self.position += step;
        }

        if !mono.is_empty() {
            tap.push(mono);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp_track(frames: usize, sample_rate: u32) -> Arc<DecodedTrack> {
        Arc::new(DecodedTrack {
            samples: (0..frames).map(|i| i as f32 / frames as f32).collect(),
            channels: 1,
            sample_rate,
        })
    }

    #[test]
    fn test_paused_transport_renders_silence() {
        let mut transport = Transport::new(1.0);
        transport.load(ramp_track(4, 4));
        let tap = SampleTap::with_capacity(16);
        let mut out = [1.0f32; 4];
        let mut mono = Vec::new();

        transport.render(&mut out, 2, 4, &tap, &mut mono);
        assert_eq!(out, [0.0; 4]);
        assert!(tap.is_empty());
    }

    #[test]
    fn test_render_duplicates_mono_and_applies_volume() {
        let mut transport = Transport::new(0.5);
        transport.load(ramp_track(4, 4));
        transport.set_playing(true);
        let tap = SampleTap::with_capacity(16);
        let mut out = [0.0f32; 4];
        let mut mono = Vec::new();

        transport.render(&mut out, 2, 4, &tap, &mut mono);
        assert_eq!(out, [0.0, 0.0, 0.125, 0.125]);
        assert_eq!(tap.len(), 2);
        assert!((transport.position_secs() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_render_resamples_to_device_rate() {
        let mut transport = Transport::new(1.0);
        transport.load(ramp_track(4, 2));
        transport.set_playing(true);
        let tap = SampleTap::with_capacity(16);
        let mut out = [0.0f32; 4];
        let mut mono = Vec::new();

        // Device runs twice as fast: each track frame plays twice
        transport.render(&mut out, 1, 4, &tap, &mut mono);
        assert_eq!(out, [0.0, 0.0, 0.25, 0.25]);
    }

    #[test]
    fn test_end_of_track_finishes_once() {
        let mut transport = Transport::new(1.0);
        transport.load(ramp_track(2, 4));
        transport.set_playing(true);
        let tap = SampleTap::with_capacity(16);
        let mut out = [9.0f32; 4];
        let mut mono = Vec::new();

        transport.render(&mut out, 1, 4, &tap, &mut mono);
        assert_eq!(out, [0.0, 0.5, 0.0, 0.0]);
        assert!(!transport.is_playing());
        assert!(transport.take_finished());
        assert!(!transport.take_finished());
    }

    #[test]
    fn test_seek_clamps_to_track() {
        let mut transport = Transport::new(1.0);
        transport.load(ramp_track(8, 4));

        transport.seek_secs(1.0);
        assert!((transport.position_secs() - 1.0).abs() < 1e-9);
        transport.seek_secs(60.0);
        assert!((transport.position_secs() - 2.0).abs() < 1e-9);
        transport.seek_secs(-3.0);
        assert_eq!(transport.position_secs(), 0.0);
    }

    #[test]
    fn test_cannot_play_without_track() {
        let mut transport = Transport::new(2.0);
        transport.set_playing(true);
        assert!(!transport.is_playing());
        assert_eq!(transport.volume(), 1.0);
    }
}
