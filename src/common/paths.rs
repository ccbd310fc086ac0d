//! Centralized path management for ytclip

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Get the ytclip config directory (not created)
pub fn ytclip_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .context("Unable to determine user config directory")?
        .join("ytclip");
    Ok(config_dir)
}

/// Default location of the main config file
pub fn default_config_path() -> Result<PathBuf> {
    Ok(ytclip_config_dir()?.join("config.toml"))
}
