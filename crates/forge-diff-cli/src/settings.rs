//! Turns the loaded config plus command-line overrides into engine settings.

use forge_diff::{IntralineOptions, ParseLimits};
use forge_diff_config::DiffConfig;
use std::path::Path;
use std::time::Duration;

/// Limit overrides given on the command line
#[derive(Debug, Clone, Copy, Default)]
pub struct LimitOverrides {
    pub max_lines: Option<usize>,
    pub max_line_characters: Option<usize>,
    pub max_files: Option<usize>,
}

/// Load the config from `path`, or look it up when no path is given
pub fn load_config(path: Option<&Path>) -> anyhow::Result<DiffConfig> {
    match path {
        Some(path) => DiffConfig::load_from(path),
        None => Ok(DiffConfig::load()),
    }
}

pub fn parse_limits(config: &DiffConfig, overrides: LimitOverrides) -> ParseLimits {
    ParseLimits {
        max_lines: overrides.max_lines.unwrap_or(config.max_lines),
        max_line_characters: overrides
            .max_line_characters
            .unwrap_or(config.max_line_characters),
        max_files: overrides.max_files.unwrap_or(config.max_files),
    }
}

pub fn intraline_options(config: &DiffConfig) -> IntralineOptions {
    IntralineOptions {
        edit_cost: config.edit_cost,
        timeout: Duration::from_millis(config.highlight_timeout_ms),
        enabled: !config.disable_highlight,
    }
}
