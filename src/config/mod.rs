//! Configuration management for vizplay.
//!
//! This module handles loading and saving the player configuration from a TOML
//! file in the user's config directory: the output device, analyser settings,
//! surface sizes, header taglines and the playlist itself.

pub mod file;

pub use file::{config_path, VisualizerConfig, VizplayConfig};
