//! ffmpeg discovery and conversion to WAV.
//!
//! Songs that are not WAV files are converted to a temporary 16-bit PCM WAV
//! with ffmpeg before decoding. The binary is looked up at the usual install
//! locations first since PATH may be minimal when launched from a desktop
//! launcher.

use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Locates the ffmpeg binary.
///
/// Checks platform install locations (Homebrew, distro packages, snap,
/// `C:\ffmpeg`) and falls back to a `which`/`where` PATH search.
///
/// # Errors
/// - If ffmpeg is not installed anywhere we look
pub fn find_ffmpeg() -> Result<PathBuf> {
    let candidates: &[&str] = if cfg!(target_os = "macos") {
        &[
            "/opt/homebrew/bin/ffmpeg",
            "/usr/local/bin/ffmpeg",
            "/usr/bin/ffmpeg",
        ]
    } else if cfg!(target_os = "linux") {
        &["/usr/bin/ffmpeg", "/usr/local/bin/ffmpeg", "/snap/bin/ffmpeg"]
    } else if cfg!(target_os = "windows") {
        &[
            "C:\\ffmpeg\\bin\\ffmpeg.exe",
            "C:\\Program Files\\ffmpeg\\bin\\ffmpeg.exe",
        ]
    } else {
        &[]
    };

    if let Some(path) = candidates.iter().map(PathBuf::from).find(|p| p.exists()) {
        tracing::debug!("Found ffmpeg at: {}", path.display());
        return Ok(path);
    }

    let search_cmd = if cfg!(target_os = "windows") {
        "where"
    } else {
        "which"
    };

    let output = Command::new(search_cmd)
        .arg("ffmpeg")
        .output()
        .map_err(|e| anyhow!("Failed to search PATH for ffmpeg: {e}"))?;

    if output.status.success() {
        let found = String::from_utf8_lossy(&output.stdout);
        // `where` may list several matches; take the first
        if let Some(first) = found.lines().next().map(str::trim).filter(|l| !l.is_empty()) {
            tracing::debug!("Found ffmpeg in PATH at: {}", first);
            return Ok(PathBuf::from(first));
        }
    }

    Err(anyhow!(
        "ffmpeg not found, so only .wav songs can be played. Install ffmpeg:\n\
         macOS: brew install ffmpeg\n\
         Linux: apt install ffmpeg (Debian/Ubuntu) or dnf install ffmpeg (Fedora)\n\
         Windows: Download from https://ffmpeg.org/download.html"
    ))
}

/// Converts any ffmpeg-readable audio file into a 16-bit PCM WAV.
///
/// # Errors
/// - If ffmpeg cannot be found or started
/// - If ffmpeg exits with an error
pub fn convert_to_wav(input: &Path, output_wav: &Path) -> Result<()> {
    let ffmpeg_path = find_ffmpeg()?;

    let output = Command::new(&ffmpeg_path)
        .arg("-loglevel")
        .arg("error")
        .arg("-i")
        .arg(input)
        .arg("-acodec")
        .arg("pcm_s16le")
        .arg("-y")
        .arg(output_wav)
        .output()?;

    if output.status.success() {
        tracing::debug!("Converted {} to WAV", input.display());
        Ok(())
    } else {
        let error_msg = String::from_utf8_lossy(&output.stderr);
        tracing::error!("ffmpeg conversion failed: {}", error_msg);
        Err(anyhow!("Audio decoding failed: {error_msg}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_ffmpeg() {
        // Passes either way; CI machines usually lack ffmpeg
        match find_ffmpeg() {
            Ok(path) => assert!(!path.as_os_str().is_empty()),
            Err(e) => assert!(e.to_string().contains("ffmpeg")),
        }
    }
}
