//! Playlist-driven player.
//!
//! Tracks the current song and play state, owns the output stream, and
//! starts or stops the visualizer loop as playback starts and stops.

use super::decode::decode_file;
use super::output::AudioOutput;
use super::playlist::{Playlist, Song};
use super::transport::{SharedTransport, Transport};
use crate::analysis::SampleTap;
use crate::visualizer::LoopHandle;
use anyhow::{anyhow, Result};
use std::sync::Arc;

/// Music player over a fixed playlist.
pub struct Player {
    playlist: Playlist,
    current: usize,
    /// Index of the song currently in the transport
    loaded: Option<usize>,
    /// Decoded length of each song, known once it has been loaded
    durations: Vec<Option<f64>>,
    transport: SharedTransport,
    tap: SampleTap,
    output: Option<AudioOutput>,
    frame_loop: Option<LoopHandle>,
}

impl Player {
    /// Creates a stopped player with nothing loaded.
    pub fn new(playlist: Playlist, volume: f32, tap: SampleTap) -> Self {
        Self {
            durations: vec![None; playlist.len()],
            playlist,
            current: 0,
            loaded: None,
            transport: Transport::shared(volume),
            tap,
            output: None,
            frame_loop: None,
        }
    }

    /// Opens the output device. Without one the player keeps working, it
    /// just cannot be heard.
    ///
    /// # Errors
    /// - If the device cannot be opened
    pub fn attach_output(&mut self, device_spec: &str) -> Result<()> {
        let output = AudioOutput::open(device_spec, Arc::clone(&self.transport), self.tap.clone())?;
        self.output = Some(output);
        Ok(())
    }

    pub fn output_name(&self) -> Option<&str> {
        self.output.as_ref().map(AudioOutput::device_name)
    }

    /// Lets the player start and stop a visualizer loop with playback.
    pub fn set_frame_loop(&mut self, handle: LoopHandle) {
        if self.is_playing() {
            handle.start();
        } else {
            handle.stop();
        }
        self.frame_loop = Some(handle);
    }

    pub fn playlist(&self) -> &Playlist {
        &self.playlist
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_song(&self) -> Option<&Song> {
        self.playlist.get(self.current)
    }

    /// Length of the song at `index` in seconds, once it has been decoded.
    pub fn song_duration(&self, index: usize) -> Option<f64> {
        self.durations.get(index).copied().flatten()
    }

    pub fn is_playing(&self) -> bool {
        self.transport.lock().unwrap().is_playing()
    }

    /// Plays the song with the given id. Unknown ids are ignored.
    ///
    /// # Errors
    /// - If the song cannot be decoded
    pub fn play_by_id(&mut self, id: u32) -> Result<()> {
        match self.playlist.position_of(id) {
            Some(index) => {
                self.current = index;
                self.play_current()
            }
            None => {
                tracing::warn!("No song with id {} in playlist", id);
                Ok(())
            }
        }
    }

    /// Plays the song at `index` in the playlist.
    ///
    /// # Errors
    /// - If the index is out of range
    /// - If the song cannot be decoded
    pub fn play_index(&mut self, index: usize) -> Result<()> {
        if index >= self.playlist.len() {
            return Err(anyhow!(
                "Song index {} is out of range (playlist has {} songs)",
                index,
                self.playlist.len()
            ));
        }
        self.current = index;
        self.play_current()
    }

    /// Loads and starts the current song from the beginning.
    ///
    /// # Errors
    /// - If the playlist is empty
    /// - If the song file cannot be decoded
    pub fn play_current(&mut self) -> Result<()> {
        let song = self
            .playlist
            .get(self.current)
            .ok_or_else(|| anyhow!("Playlist is empty"))?;

        tracing::info!("Loading '{}' by {}", song.title, song.artist);
        let track = match decode_file(&song.resolved_path()) {
            Ok(track) => track,
            Err(e) => {
                tracing::error!("Playback failed: {}", e);
                // The failed song is current now, so toggling retries it
                self.transport.lock().unwrap().unload();
                self.loaded = None;
                self.set_playing(false);
                return Err(e);
            }
        };

        if let Some(slot) = self.durations.get_mut(self.current) {
            *slot = Some(track.duration_secs());
        }
        self.transport.lock().unwrap().load(Arc::new(track));
        self.tap.clear();
        self.loaded = Some(self.current);
        self.set_playing(true);
        Ok(())
    }

    /// Pauses when playing, resumes when a song is loaded, otherwise starts
    /// the current song.
    ///
    /// # Errors
    /// - If starting the current song fails
    pub fn toggle(&mut self) -> Result<()> {
        if self.is_playing() {
            self.set_playing(false);
            Ok(())
        } else if self.loaded.is_some() {
            self.set_playing(true);
            Ok(())
        } else {
            self.play_current()
        }
    }

    /// Advances to the next song, wrapping to the first.
    ///
    /// # Errors
    /// - If the next song cannot be decoded
    pub fn next(&mut self) -> Result<()> {
        if self.playlist.is_empty() {
            return Ok(());
        }
        self.current = (self.current + 1) % self.playlist.len();
        self.play_current()
    }

    /// Goes back to the previous song, wrapping to the last.
    ///
    /// # Errors
    /// - If the previous song cannot be decoded
    pub fn prev(&mut self) -> Result<()> {
        if self.playlist.is_empty() {
            return Ok(());
        }
        let len = self.playlist.len();
        self.current = (self.current + len - 1) % len;
        self.play_current()
    }

    /// Seeks to a percentage (0-100) of the loaded song.
    pub fn seek_percent(&mut self, percent: f64) {
        let mut transport = self.transport.lock().unwrap();
        let target = percent.clamp(0.0, 100.0) / 100.0 * transport.duration_secs();
        transport.seek_secs(target);
    }

    /// Seeks relative to the current position.
    pub fn seek_by(&mut self, seconds: f64) {
        let mut transport = self.transport.lock().unwrap();
        let target = transport.position_secs() + seconds;
        transport.seek_secs(target);
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.transport.lock().unwrap().set_volume(volume);
    }

    pub fn volume(&self) -> f32 {
        self.transport.lock().unwrap().volume()
    }

    /// (position, duration) of the loaded song in seconds.
    pub fn progress(&self) -> Option<(f64, f64)> {
        self.loaded?;
        let transport = self.transport.lock().unwrap();
        Some((transport.position_secs(), transport.duration_secs()))
    }

    /// Position as a percentage of the duration, 0 when nothing is loaded.
    pub fn progress_percent(&self) -> f64 {
        match self.progress() {
            Some((position, duration)) if duration > 0.0 => position / duration * 100.0,
            _ => 0.0,
        }
    }

    /// Picks up the end of a song reported by the audio thread.
    pub fn poll(&mut self) {
        let finished = self.transport.lock().unwrap().take_finished();
        if finished {
            tracing::info!("Playback finished");
            self.set_playing(false);
        }
    }

    fn set_playing(&mut self, playing: bool) {
        let now_playing = {
            let mut transport = self.transport.lock().unwrap();
            transport.set_playing(playing);
            transport.is_playing()
        };

        if let Some(handle) = &self.frame_loop {
            if now_playing {
                handle.start();
            } else {
                handle.stop();
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn transport(&self) -> &SharedTransport {
        &self.transport
    }
}

/// Formats seconds as `m:ss`.
pub fn format_time(seconds: f64) -> String {
    let seconds = seconds.max(0.0);
    let minutes = (seconds / 60.0).floor() as u64;
    let secs = (seconds % 60.0).floor() as u64;
    format!("{minutes}:{secs:02}")
}
