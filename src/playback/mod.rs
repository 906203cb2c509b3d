//! Music playback for vizplay.
//!
//! Loads songs from the configured playlist, decodes them, and plays them
//! through the system output device while feeding the analysis tap.

pub mod decode;
pub mod ffmpeg;
pub mod output;
pub mod player;
pub mod playlist;
pub mod transport;

pub use player::{format_time, Player};
pub use playlist::{Playlist, Song};
