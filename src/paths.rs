//! Centralized path resolution for orgsync
//!
//! # Environment Variables
//!
//! - `ORGSYNC_CONFIG_DIR` - Override config directory (e.g., `~/infra/orgsync`)
//!
//! # Path Resolution Priority
//!
//! For config_dir():
//! 1. `--config-dir` flag or `ORGSYNC_CONFIG_DIR` environment variable
//! 2. `./.orgsync` in the current directory, if it exists
//! 3. `XDG_CONFIG_HOME/orgsync` (if set)
//! 4. Default: `~/.config/orgsync`

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Environment variable for config directory override
pub const ENV_CONFIG_DIR: &str = "ORGSYNC_CONFIG_DIR";

/// Directory name looked up in the current working directory
const LOCAL_DIR: &str = ".orgsync";

/// Get the orgsync config directory path
///
/// `explicit` is the `--config-dir` flag; clap already folds the
/// environment variable into it, but the variable is re-checked so the
/// function behaves the same when called without a CLI.
pub fn config_dir(explicit: Option<&Path>) -> Result<PathBuf> {
    // 1. Flag or environment variable
    if let Some(dir) = explicit {
        let path = expand(&dir.to_string_lossy());
        log::debug!("Using config dir from flag: {}", path.display());
        return Ok(path);
    }
    if let Ok(dir) = std::env::var(ENV_CONFIG_DIR) {
        let path = expand(&dir);
        log::debug!(
            "Using config dir from {}: {}",
            ENV_CONFIG_DIR,
            path.display()
        );
        return Ok(path);
    }

    // 2. Project-local directory
    let local = PathBuf::from(LOCAL_DIR);
    if local.is_dir() {
        log::debug!("Using local config dir: {}", local.display());
        return Ok(local);
    }

    // 3. XDG_CONFIG_HOME
    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        let path = PathBuf::from(xdg_config).join("orgsync");
        log::debug!("Using XDG_CONFIG_HOME: {}", path.display());
        return Ok(path);
    }

    // 4. ~/.config/orgsync
    let home = dirs::home_dir().context("Could not determine home directory")?;
    let path = home.join(".config").join("orgsync");
    log::debug!("Using default config dir: {}", path.display());
    Ok(path)
}

/// Expand ~ and environment variables in a path string.
pub fn expand(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path).unwrap_or(std::borrow::Cow::Borrowed(path));
    PathBuf::from(expanded.as_ref())
}

// ============================================================================
// Tests
// ============================================================================
