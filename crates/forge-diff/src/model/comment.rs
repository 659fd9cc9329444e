//! Review comments anchored on diff lines.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Comments of one issue grouped by file path, then by signed line number.
pub type CodeComments = HashMap<String, HashMap<i64, Vec<CodeComment>>>;

/// An existing code review comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeComment {
    pub id: i64,
    /// File path the comment belongs to.
    pub tree_path: String,
    /// Signed line: positive on the new side, negative on the old side.
    pub line: i64,
    /// Comment body (markdown).
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl CodeComment {
    /// Which side of the diff the comment is anchored on.
    pub fn side(&self) -> CommentSide {
        if self.line < 0 {
            CommentSide::Previous
        } else {
            CommentSide::Proposed
        }
    }
}

/// Which version of the file a comment refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentSide {
    /// Old file (deletions side).
    Previous,
    /// New file (additions side).
    Proposed,
}

impl CommentSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommentSide::Previous => "previous",
            CommentSide::Proposed => "proposed",
        }
    }
}

/// Group a flat list of comments the way [`crate::Diff::bind_comments`]
/// expects them. Comments on line 0 are dropped.
pub fn group_code_comments(comments: impl IntoIterator<Item = CodeComment>) -> CodeComments {
    let mut grouped = CodeComments::new();
    for comment in comments {
        if comment.line == 0 {
            log::debug!("skipping code comment {} without a line", comment.id);
            continue;
        }
        grouped
            .entry(comment.tree_path.clone())
            .or_default()
            .entry(comment.line)
            .or_default()
            .push(comment);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment(id: i64, path: &str, line: i64) -> CodeComment {
        CodeComment {
            id,
            tree_path: path.to_string(),
            line,
            content: String::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_comment_side() {
        assert_eq!(comment(1, "a", -3).side(), CommentSide::Previous);
        assert_eq!(comment(1, "a", 3).side(), CommentSide::Proposed);
        assert_eq!(CommentSide::Previous.as_str(), "previous");
        assert_eq!(CommentSide::Proposed.as_str(), "proposed");
    }

    #[test]
    fn test_group_code_comments() {
        let grouped = group_code_comments(vec![
            comment(1, "a.rs", 3),
            comment(2, "a.rs", -3),
            comment(3, "a.rs", 3),
            comment(4, "b.rs", 1),
            comment(5, "b.rs", 0),
        ]);

        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped["a.rs"][&3].len(), 2);
        assert_eq!(grouped["a.rs"][&-3].len(), 1);
        assert_eq!(grouped["b.rs"].len(), 1);
    }
}
