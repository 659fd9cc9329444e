//! Configuration for forge-diff
//!
//! This crate provides:
//! - Config file lookup (working directory, home, platform config dir)
//! - The engine limits and highlighting settings (DiffConfig)

pub mod config_file;
pub mod diff_config;
pub mod paths;

pub use config_file::load_config_file;
pub use diff_config::DiffConfig;
