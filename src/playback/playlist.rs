//! Songs and the playlist they form.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// A playable entry from the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    pub id: u32,
    pub title: String,
    pub artist: String,
    #[serde(default)]
    pub genre: String,
    /// Local audio file; a leading `~/` refers to the home directory
    pub file: PathBuf,
}

impl Song {
    /// File path with a leading `~/` expanded.
    pub fn resolved_path(&self) -> PathBuf {
        expand_home(&self.file)
    }
}

fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    }
}

/// Ordered list of songs with unique ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Playlist {
    songs: Vec<Song>,
}

impl Playlist {
    /// Builds a playlist, rejecting duplicate ids.
    ///
    /// # Errors
    /// - If two songs share an id
    pub fn new(songs: Vec<Song>) -> Result<Self> {
        let mut seen = HashSet::new();
        for song in &songs {
            if !seen.insert(song.id) {
                return Err(anyhow!("Duplicate song id {} in playlist", song.id));
            }
        }
        Ok(Self { songs })
    }

    pub fn len(&self) -> usize {
        self.songs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Song> {
        self.songs.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Song> {
        self.songs.iter()
    }

    /// Index of the song with the given id.
    pub fn position_of(&self, id: u32) -> Option<usize> {
        self.songs.iter().position(|song| song.id == id)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn song(id: u32, file: &str) -> Song {
        Song {
            id,
            title: format!("Song {id}"),
            artist: "Artist".to_string(),
            genre: String::new(),
            file: PathBuf::from(file),
        }
    }

    #[test]
    fn test_duplicate_ids_are_rejected() {
        assert!(Playlist::new(vec![song(1, "a.wav"), song(1, "b.wav")]).is_err());
        assert!(Playlist::new(vec![song(1, "a.wav"), song(2, "b.wav")]).is_ok());
    }

    #[test]
    fn test_position_of() {
        let playlist = Playlist::new(vec![song(4, "a.wav"), song(9, "b.wav")]).unwrap();
        assert_eq!(playlist.position_of(9), Some(1));
        assert_eq!(playlist.position_of(5), None);
    }

    #[test]
    fn test_home_expansion() {
        let relative = song(1, "music/a.wav");
        assert_eq!(relative.resolved_path(), PathBuf::from("music/a.wav"));

        if let Some(home) = dirs::home_dir() {
            let tilde = song(2, "~/Music/a.wav");
            assert_eq!(tilde.resolved_path(), home.join("Music/a.wav"));
        }
    }
}
