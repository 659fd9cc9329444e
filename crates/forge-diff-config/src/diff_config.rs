//! Diff engine configuration
//!
//! Configuration loaded from .forge-diff.toml file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Limits and highlighting settings loaded from .forge-diff.toml
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct DiffConfig {
    /// Content lines per file before the file is marked incomplete
    #[serde(default = "default_max_lines")]
    pub max_lines: usize,

    /// Characters per content line before the line is cut
    #[serde(default = "default_max_line_characters")]
    pub max_line_characters: usize,

    /// Files per diff before the rest of the patch is skipped
    #[serde(default = "default_max_files")]
    pub max_files: usize,

    /// Lines shown above a commented line
    #[serde(default = "default_context_lines")]
    pub context_lines: usize,

    /// Cost of an extra edit when cleaning up intraline diffs
    #[serde(default = "default_edit_cost")]
    pub edit_cost: usize,

    #[serde(default = "default_highlight_timeout_ms")]
    pub highlight_timeout_ms: u64,

    /// Render changed lines without intraline markup
    #[serde(default)]
    pub disable_highlight: bool,
}

fn default_max_lines() -> usize {
    1000
}

fn default_max_line_characters() -> usize {
    5000
}

fn default_max_files() -> usize {
    100
}

fn default_context_lines() -> usize {
    4
}

fn default_edit_cost() -> usize {
    100
}

fn default_highlight_timeout_ms() -> u64 {
    1000
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            max_lines: default_max_lines(),
            max_line_characters: default_max_line_characters(),
            max_files: default_max_files(),
            context_lines: default_context_lines(),
            edit_cost: default_edit_cost(),
            highlight_timeout_ms: default_highlight_timeout_ms(),
            disable_highlight: false,
        }
    }
}

impl DiffConfig {
    /// Load config from CWD first, then home directory, then the platform
    /// config directory, or use defaults
    pub fn load() -> Self {
        if let Some((path, content)) = crate::load_config_file() {
            match toml::from_str(&content) {
                Ok(config) => {
                    log::info!("Loaded diff config from {}", path.display());
                    return config;
                }
                Err(e) => {
                    log::warn!("Failed to parse config file {}: {}", path.display(), e);
                }
            }
        }

        log::debug!("Using default diff config");
        Self::default()
    }

    /// Load config from an explicit file, failing if it cannot be read or parsed
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }
}
