//! First-run setup.
//!
//! Writes the default configuration when the config file is missing.

use anyhow::anyhow;
use std::path::Path;

/// Embedded default configuration template.
const DEFAULT_CONFIG: &str = include_str!("../../environments/vizplay.toml");

/// Current application version from Cargo.toml
const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Writes the default config to `config_path` unless a file is already there.
///
/// Returns whether a new file was written.
///
/// # Errors
/// Returns an error if the directory or file cannot be written.
pub fn ensure_config(config_path: &Path) -> anyhow::Result<bool> {
    if config_path.exists() {
        return Ok(false);
    }

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| anyhow!("Failed to create {}: {e}", parent.display()))?;
    }

    std::fs::write(config_path, default_config())?;
    tracing::info!("Wrote default config to {}", config_path.display());
    Ok(true)
}

/// Default config text with its version prefix.
fn default_config() -> String {
    let config_with_version = format!(r#"config_version = "{}""#, CURRENT_VERSION);
    format!("{}\n{}", config_with_version, DEFAULT_CONFIG)
}
