use crate::paths::config_candidates;
use std::path::PathBuf;

/// Load config file content from the first location that has one
///
/// Searches in:
/// 1. Current working directory as .forge-diff.toml
/// 2. Home directory as .forge-diff.toml
/// 3. Platform config directory as forge-diff/config.toml
///
/// Returns the path and file content if found, None otherwise.
pub fn load_config_file() -> Option<(PathBuf, String)> {
    for path in config_candidates() {
        if let Ok(content) = std::fs::read_to_string(&path) {
            log::debug!("Loaded config from {}", path.display());
            return Some((path, content));
        }
    }

    None
}
