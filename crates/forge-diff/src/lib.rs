//! # forge-diff
//!
//! The diff engine of a Git forge: turns `git diff --patch` output into a
//! structured model that can be rendered, commented on and sliced.
//!
//! ## Design Principles
//!
//! The engine is **synchronous and free of I/O of its own**. It reads from a
//! caller-supplied reader and consults collaborators through traits, so it can
//! be used from a web handler, a CLI or a test without any setup:
//!
//! - [`LfsObjectStore`] answers whether an LFS pointer refers to a stored object
//! - [`CodeCommentSource`] provides review comments to attach to lines
//!
//! Hard failures (read errors, broken quoted file names) are returned as
//! [`ParseError`]. Everything else degrades: truncated files and diffs are
//! flagged with `is_incomplete` instead of failing.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use forge_diff::{parse_patch, IntralineDiffer, NoLfsObjects, ParseLimits};
//!
//! let diff = parse_patch(ParseLimits::default(), &NoLfsObjects, std::io::stdin())?;
//!
//! let differ = IntralineDiffer::default();
//! for file in &diff.files {
//!     for section in &file.sections {
//!         for line in &section.lines {
//!             println!("{}", differ.computed_inline_diff_for(section, line));
//!         }
//!     }
//! }
//! ```

pub mod encoding;
pub mod highlight;
pub mod model;
pub mod parser;
pub mod traits;

// Re-export commonly used types
pub use encoding::normalize_lines;
pub use highlight::{get_line_content, IntralineDiffer, IntralineOptions, SafeHtml};
pub use model::{
    group_code_comments, CodeComment, CodeComments, CommentSide, Diff, DiffFile, DiffFileType,
    DiffLine, DiffLineSectionInfo, DiffLineType, DiffSection, ExpandDirection,
    BLOB_EXCERPT_CHUNK_SIZE,
};
pub use parser::{
    cut_diff_around_line, parse_patch, parse_patch_skip_to, parse_patch_str, HunkHeader,
    ParseError, ParseLimits,
};
pub use traits::{
    CodeCommentSource, CommentSourceError, LfsObjectStore, NoLfsObjects, NoOpCommentSource,
};

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PATCH: &str = "diff --git a/src/lib.rs b/src/lib.rs
index 3f2a1b0..7c9d4e2 100644
--- a/src/lib.rs
+++ b/src/lib.rs
@@ -1,5 +1,5 @@
 pub fn answer() -> u32 {
-    41
+    42
 }
\x20
 pub fn other() {}
";

    #[test]
    fn test_round_trip_small_patch() {
        let diff = parse_patch_str(ParseLimits::default(), &NoLfsObjects, PATCH).unwrap();
        assert_eq!(diff.num_files(), 1);

        let file = &diff.files[0];
        assert_eq!(file.addition, 1);
        assert_eq!(file.deletion, 1);
        assert_eq!(file.sections.len(), 1);
        // One added, one deleted and four context lines.
        assert_eq!(file.sections[0].lines.len() - 1, 6);
    }

    #[test]
    fn test_parse_bind_and_render() {
        let mut diff = parse_patch_str(ParseLimits::default(), &NoLfsObjects, PATCH).unwrap();
        let comments = group_code_comments(vec![CodeComment {
            id: 1,
            tree_path: "src/lib.rs".to_string(),
            line: 2,
            content: "why 42?".to_string(),
            created_at: chrono::Utc::now(),
        }]);
        diff.bind_comments(&comments);

        let section = &diff.files[0].sections[0];
        let added = &section.lines[3];
        assert_eq!(added.line_type, DiffLineType::Add);
        assert_eq!(added.comments.len(), 1);
        assert_eq!(added.comment_side(), Some(CommentSide::Proposed));
        assert!(!added.can_comment());

        let differ = IntralineDiffer::default();
        assert_eq!(
            differ.computed_inline_diff_for(section, added).as_str(),
            r#"    4<span class="added-code">2</span>"#
        );
    }

    #[test]
    fn test_cut_around_parsed_line() {
        let cut = cut_diff_around_line(PATCH, 2, false, 1);
        assert_eq!(
            cut,
            "diff --git a/src/lib.rs b/src/lib.rs
--- a/src/lib.rs
+++ b/src/lib.rs
@@ -3,0 +2,1 @@
+    42"
        );
    }
}
