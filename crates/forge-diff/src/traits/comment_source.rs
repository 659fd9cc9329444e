//! Trait for fetching existing review comments.

use crate::model::CodeComments;
use thiserror::Error;

/// Errors that can occur while fetching comments.
#[derive(Debug, Error)]
pub enum CommentSourceError {
    /// The issue does not exist.
    #[error("Issue not found: {0}")]
    IssueNotFound(i64),

    /// The backing store failed.
    #[error("Failed to fetch comments: {0}")]
    FetchFailed(String),

    /// The comment source is not available.
    #[error("Comment source unavailable: {0}")]
    Unavailable(String),
}

/// Provides the code comments of an issue (pull request).
///
/// Implementations return the comments grouped by file path and signed line
/// number, see [`crate::model::group_code_comments`].
pub trait CodeCommentSource {
    fn fetch_code_comments(&self, issue_id: i64) -> Result<CodeComments, CommentSourceError>;
}

/// A comment source with no comments, for previews without review data.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpCommentSource;

impl CodeCommentSource for NoOpCommentSource {
    fn fetch_code_comments(&self, _issue_id: i64) -> Result<CodeComments, CommentSourceError> {
        Ok(CodeComments::new())
    }
}
