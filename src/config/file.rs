//! Configuration file management for vizplay.
//!
//! This module handles loading and saving application configuration from TOML files.
//! Configuration is stored in the user's config directory.

use crate::analysis::AnalyserSettings;
use crate::playback::{Playlist, Song};
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Audio output configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AudioConfig {
    /// Output device to use. Options:
    /// - "default" for system default device
    /// - numeric index (0, 1, 2, etc.) from `vizplay list-devices`
    /// - device name from `vizplay list-devices`
    #[serde(default = "default_device")]
    pub device: String,
    /// Initial playback volume (0.0-1.0)
    #[serde(default = "default_volume")]
    pub volume: f32,
}

fn default_device() -> String {
    "default".to_string()
}

fn default_volume() -> f32 {
    0.7
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device: default_device(),
            volume: default_volume(),
        }
    }
}

/// Analyser parameters and surface sizes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VisualizerConfig {
    /// FFT size, a power of two in 32..=32768
    pub fft_size: usize,
    /// Spectrum smoothing between frames (0.0-1.0)
    pub smoothing_time_constant: f32,
    /// Level mapped to byte 0
    pub min_decibels: f32,
    /// Level mapped to byte 255
    pub max_decibels: f32,
    pub wave_width: u32,
    pub wave_height: u32,
    pub bar_width: u32,
    pub bar_height: u32,
}

impl Default for VisualizerConfig {
    fn default() -> Self {
        let analyser = AnalyserSettings::default();
        Self {
            fft_size: analyser.fft_size,
            smoothing_time_constant: analyser.smoothing_time_constant,
            min_decibels: analyser.min_decibels,
            max_decibels: analyser.max_decibels,
            wave_width: 300,
            wave_height: 150,
            bar_width: 300,
            bar_height: 150,
        }
    }
}

impl VisualizerConfig {
    pub fn analyser_settings(&self) -> AnalyserSettings {
        AnalyserSettings {
            fft_size: self.fft_size,
            smoothing_time_constant: self.smoothing_time_constant,
            min_decibels: self.min_decibels,
            max_decibels: self.max_decibels,
        }
    }

    pub fn wave_size(&self) -> (u32, u32) {
        (self.wave_width, self.wave_height)
    }

    pub fn bar_size(&self) -> (u32, u32) {
        (self.bar_width, self.bar_height)
    }
}

/// Terminal UI configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UiConfig {
    /// Lines cycled by the typing effect in the header
    pub taglines: Vec<String>,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            taglines: vec![
                "Feel the rhythm".to_string(),
                "Watch your music come alive".to_string(),
                "Sound you can see".to_string(),
            ],
        }
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct VizplayConfig {
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub visualizer: VisualizerConfig,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub songs: Vec<Song>,
}

impl VizplayConfig {
    /// Loads configuration from the user's config directory.
    ///
    /// # Errors
    /// - If the config directory cannot be determined
    /// - If the config file cannot be read
    /// - If the TOML is malformed
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path()?)
    }

    /// Loads configuration from an explicit path.
    ///
    /// # Errors
    /// - If the file cannot be read
    /// - If the TOML is malformed
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| anyhow!("Failed to read {}: {e}", path.display()))?;
        Self::from_toml(&content)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    /// - If the TOML is malformed or a field has the wrong type
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| anyhow!("Invalid configuration: {e}"))
    }

    /// Checks values serde cannot check on its own. Analyser settings are
    /// left to the visualizer, which switches itself off when they are bad.
    ///
    /// # Errors
    /// - If the volume is outside 0.0-1.0
    /// - If two songs share an id
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.audio.volume) {
            return Err(anyhow!(
                "audio.volume must be between 0.0 and 1.0, got {}",
                self.audio.volume
            ));
        }

        self.playlist().map(|_| ())
    }

    /// Builds the playlist from the configured songs.
    ///
    /// # Errors
    /// - If two songs share an id
    pub fn playlist(&self) -> Result<Playlist> {
        Playlist::new(self.songs.clone())
    }
}

/// Retrieves the path to the config file, creating its directory.
///
/// # Errors
/// - If the home directory cannot be determined
/// - If the config directory cannot be created
pub fn config_path() -> Result<PathBuf> {
    let config_dir = dirs::home_dir()
        .ok_or_else(|| anyhow!("Could not determine home directory"))?
        .join(".config")
        .join("vizplay");

    fs::create_dir_all(&config_dir)
        .map_err(|e| anyhow!("Failed to create config directory: {e}"))?;

    Ok(config_dir.join("vizplay.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = VizplayConfig::from_toml("").unwrap();
        assert_eq!(config.audio.device, "default");
        assert_eq!(config.audio.volume, 0.7);
        assert_eq!(config.visualizer, VisualizerConfig::default());
        assert_eq!(config.visualizer.analyser_settings(), AnalyserSettings::default());
        assert!(config.songs.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_sections_fill_in_defaults() {
        let config = VizplayConfig::from_toml(
            r#"
config_version = "0.1.0"

[audio]
device = "2"

[visualizer]
fft_size = 512

[[songs]]
id = 7
title = "Night Drive"
artist = "Neon Dreams"
file = "~/Music/night-drive.mp3"
"#,
        )
        .unwrap();

        assert_eq!(config.audio.device, "2");
        assert_eq!(config.audio.volume, 0.7);
        assert_eq!(config.visualizer.fft_size, 512);
        assert_eq!(config.visualizer.smoothing_time_constant, 0.8);
        assert_eq!(config.visualizer.wave_size(), (300, 150));
        assert_eq!(config.songs.len(), 1);
        assert_eq!(config.songs[0].genre, "");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_round_trip_through_toml() {
        let mut config = VizplayConfig::default();
        config.audio.volume = 0.4;
        config.visualizer.bar_height = 90;
        config.ui.taglines = vec!["Just one line".to_string()];

        let text = toml::to_string_pretty(&config).unwrap();
        assert_eq!(VizplayConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = VizplayConfig::default();
        config.audio.volume = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_analyser_settings_still_validate() {
        let mut config = VizplayConfig::default();
        config.visualizer.fft_size = 300;
        assert!(config.validate().is_ok());
        assert!(config.visualizer.analyser_settings().validate().is_err());

        let mut config = VizplayConfig::default();
        config.visualizer.min_decibels = -20.0;
        assert!(config.validate().is_ok());
        assert!(config.visualizer.analyser_settings().validate().is_err());
    }

    #[test]
    fn test_duplicate_song_ids_rejected() {
        let config = VizplayConfig::from_toml(
            r#"
[[songs]]
id = 1
title = "A"
artist = "X"
file = "a.wav"

[[songs]]
id = 1
title = "B"
artist = "Y"
file = "b.wav"
"#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_toml_is_an_error() {
        let err = VizplayConfig::from_toml("[audio\nvolume = ").unwrap_err();
        assert!(err.to_string().contains("Invalid configuration"));
    }
}
