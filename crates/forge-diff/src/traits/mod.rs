//! Collaborators the engine consults without owning them.

mod comment_source;
mod lfs_store;

pub use comment_source::{CodeCommentSource, CommentSourceError, NoOpCommentSource};
pub use lfs_store::{LfsObjectStore, NoLfsObjects};
