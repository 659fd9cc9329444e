//! Data models for diff representation.

mod comment;
mod diff;

pub use comment::{group_code_comments, CodeComment, CodeComments, CommentSide};
pub use diff::{
    Diff, DiffFile, DiffFileType, DiffLine, DiffLineSectionInfo, DiffLineType, DiffSection,
    ExpandDirection, BLOB_EXCERPT_CHUNK_SIZE,
};
