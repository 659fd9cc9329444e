//! Stderr logging using env_logger
//!
//! Defaults to `warn` so that stdout stays clean for JSON and diff output.
//! `RUST_LOG` overrides the level, e.g. `RUST_LOG=forge_diff=debug`.

use env_logger::{Builder, Env};

/// Initialize logging to stderr
pub fn init() {
    Builder::from_env(Env::default().default_filter_or("warn"))
        .format_timestamp_millis()
        .init();
}
