//! Parsers for unified diff text.

mod cut;
mod git_header;
mod hunk_header;
mod patch;

pub use cut::cut_diff_around_line;
pub use hunk_header::HunkHeader;
pub use patch::{parse_patch, parse_patch_skip_to, parse_patch_str, ParseError, ParseLimits};
