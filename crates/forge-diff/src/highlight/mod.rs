//! Intraline highlighting of changed lines.

mod cleanup;
mod inline;

pub use cleanup::{cleanup_efficiency, cleanup_merge, Op, Segment};
pub use inline::{get_line_content, IntralineDiffer, IntralineOptions, SafeHtml};
