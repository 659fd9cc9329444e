//! Configuration file locations
//!
//! Uses XDG directories via `dirs` crate.
//!
//! Platform-specific locations:
//! - Linux: `~/.config/forge-diff/config.toml`
//! - macOS: `~/Library/Application Support/forge-diff/config.toml`
//! - Windows: `%APPDATA%\forge-diff\config.toml`

use anyhow::{Context, Result};
use std::path::PathBuf;

const APP_NAME: &str = "forge-diff";

/// Name of the config file looked up in the working and home directories
pub const LOCAL_CONFIG_FILE: &str = ".forge-diff.toml";

/// Get the application config directory, without creating it
pub fn config_dir() -> Result<PathBuf> {
    let base = dirs::config_dir().context("Could not determine config directory")?;
    Ok(base.join(APP_NAME))
}

/// Get path to the config file in the application config directory
pub fn app_config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

/// Get path to the config file in the home directory
pub fn home_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(LOCAL_CONFIG_FILE))
}

/// Candidate config files, in lookup order
pub fn config_candidates() -> Vec<PathBuf> {
    let mut candidates = vec![PathBuf::from(LOCAL_CONFIG_FILE)];
    candidates.extend(home_config_path());
    match app_config_path() {
        Ok(path) => candidates.push(path),
        Err(e) => log::debug!("No platform config path: {}", e),
    }
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidates_start_in_working_directory() {
        let candidates = config_candidates();
        assert_eq!(candidates[0], PathBuf::from(".forge-diff.toml"));
        assert!(candidates.len() <= 3);
    }

    #[test]
    fn test_app_config_path() {
        if let Ok(path) = app_config_path() {
            assert!(path.ends_with("forge-diff/config.toml"));
        }
    }
}
