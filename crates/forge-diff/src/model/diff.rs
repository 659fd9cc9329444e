//! Diff data structures produced by the patch parser.

use super::comment::{CodeComment, CodeComments, CommentSide};
use crate::traits::{CodeCommentSource, CommentSourceError};
use serde::{Deserialize, Serialize};

/// A parsed comparison between two trees.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Diff {
    /// Added lines across all files.
    pub total_addition: usize,
    /// Deleted lines across all files.
    pub total_deletion: usize,
    /// Files in the order they appear in the patch.
    pub files: Vec<DiffFile>,
    /// The file limit was hit and the rest of the patch was discarded.
    pub is_incomplete: bool,
    /// File the parse was asked to start at.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    /// First file left out by the file limit; parsing again from it
    /// continues where this diff stopped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
}

impl Diff {
    /// Create an empty diff.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of files in this diff.
    pub fn num_files(&self) -> usize {
        self.files.len()
    }

    /// Recalculate totals from files.
    pub fn recalculate_totals(&mut self) {
        self.total_addition = self.files.iter().map(|f| f.addition).sum();
        self.total_deletion = self.files.iter().map(|f| f.deletion).sum();
    }

    /// Attach review comments to the lines they are anchored on.
    ///
    /// A line picks up the comments stored under `-left_idx` (old side) and
    /// under `right_idx` (new side). The merged list is ordered by creation
    /// time, then id.
    pub fn bind_comments(&mut self, comments: &CodeComments) {
        for file in &mut self.files {
            let Some(by_line) = comments.get(&file.name) else {
                continue;
            };
            for line in file.sections.iter_mut().flat_map(|s| s.lines.iter_mut()) {
                if line.left_idx > 0 {
                    if let Some(found) = by_line.get(&-i64::from(line.left_idx)) {
                        line.comments.extend(found.iter().cloned());
                    }
                }
                if line.right_idx > 0 {
                    if let Some(found) = by_line.get(&i64::from(line.right_idx)) {
                        line.comments.extend(found.iter().cloned());
                    }
                }
                line.comments
                    .sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
            }
        }
    }

    /// Fetch the code comments of an issue and bind them.
    pub fn load_comments(
        &mut self,
        source: &dyn CodeCommentSource,
        issue_id: i64,
    ) -> Result<(), CommentSourceError> {
        let comments = source.fetch_code_comments(issue_id)?;
        self.bind_comments(&comments);
        Ok(())
    }
}

/// A single file's diff.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiffFile {
    /// Current path.
    pub name: String,
    /// Path before a rename or copy, otherwise equal to `name`.
    pub old_name: String,
    /// 1-based position within [`Diff::files`].
    pub index: usize,
    pub addition: usize,
    pub deletion: usize,
    pub file_type: DiffFileType,
    pub is_created: bool,
    pub is_deleted: bool,
    pub is_bin: bool,
    pub is_lfs_file: bool,
    pub is_renamed: bool,
    pub is_submodule: bool,
    /// Some lines or sections of this file were dropped.
    pub is_incomplete: bool,
    /// At least one line was cut at the character limit.
    pub is_incomplete_line_too_long: bool,
    pub sections: Vec<DiffSection>,
}

impl DiffFile {
    /// Create a changed-file entry for the given paths.
    pub fn new(index: usize, old_name: impl Into<String>, name: impl Into<String>) -> Self {
        let old_name = old_name.into();
        let name = name.into();
        Self {
            is_renamed: old_name != name,
            old_name,
            name,
            index,
            ..Self::default()
        }
    }

    /// The path to show for this file: its name, or the old name when the
    /// new side has none.
    pub fn diff_file_name(&self) -> &str {
        if self.name.is_empty() {
            &self.old_name
        } else {
            &self.name
        }
    }

    /// All lines of all sections, in order.
    pub fn lines(&self) -> impl Iterator<Item = &DiffLine> {
        self.sections.iter().flat_map(|s| s.lines.iter())
    }
}

/// How a file changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffFileType {
    Add,
    #[default]
    Change,
    Delete,
    Rename,
    Copy,
}

/// One `@@ ... @@` hunk of a file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiffSection {
    /// The raw hunk header line.
    pub name: String,
    /// Path of the file this section belongs to.
    pub file_name: String,
    /// Lines of the hunk; the first one is the `Section` header line.
    pub lines: Vec<DiffLine>,
}

impl DiffSection {
    /// Find the line of `line_type` paired with the opposite line at `idx`.
    ///
    /// Pairing only happens inside the contiguous add/del run that contains
    /// the candidate. `difference` is re-based on every plain or section line,
    /// and a run with unequal numbers of additions and deletions has no
    /// pairing at all.
    pub fn get_line(&self, line_type: DiffLineType, idx: u32) -> Option<&DiffLine> {
        let idx = i64::from(idx);
        let mut difference = 0i64;
        let mut add_count = 0usize;
        let mut del_count = 0usize;
        let mut matched: Option<&DiffLine> = None;

        for line in &self.lines {
            match line.line_type {
                DiffLineType::Add => add_count += 1,
                DiffLineType::Del => del_count += 1,
                DiffLineType::Plain | DiffLineType::Section => {
                    if matched.is_some() {
                        break;
                    }
                    difference = i64::from(line.right_idx) - i64::from(line.left_idx);
                    add_count = 0;
                    del_count = 0;
                }
            }

            match line_type {
                DiffLineType::Del => {
                    if line.line_type == DiffLineType::Del
                        && i64::from(line.left_idx) == idx - difference
                    {
                        matched = Some(line);
                    }
                }
                DiffLineType::Add => {
                    if line.line_type == DiffLineType::Add
                        && i64::from(line.right_idx) == idx + difference
                    {
                        matched = Some(line);
                    }
                }
                DiffLineType::Plain | DiffLineType::Section => {}
            }
        }

        if add_count == del_count {
            matched
        } else {
            None
        }
    }
}

/// One physical line of a hunk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffLine {
    /// Line number in the old file, 0 when absent.
    pub left_idx: u32,
    /// Line number in the new file, 0 when absent.
    pub right_idx: u32,
    pub line_type: DiffLineType,
    /// Raw text including the leading marker. Section lines hold the header.
    pub content: String,
    /// Review comments anchored on this line.
    #[serde(default)]
    pub comments: Vec<CodeComment>,
    /// Position in the section of the line this one replaces or is
    /// replaced by.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_idx: Option<usize>,
    /// Set on section lines only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_info: Option<DiffLineSectionInfo>,
}

impl DiffLine {
    /// Create an unchanged line.
    pub fn plain(content: impl Into<String>, left_idx: u32, right_idx: u32) -> Self {
        Self::with_type(DiffLineType::Plain, content, left_idx, right_idx)
    }

    /// Create an added line.
    pub fn addition(content: impl Into<String>, right_idx: u32) -> Self {
        Self::with_type(DiffLineType::Add, content, 0, right_idx)
    }

    /// Create a deleted line.
    pub fn deletion(content: impl Into<String>, left_idx: u32) -> Self {
        Self::with_type(DiffLineType::Del, content, left_idx, 0)
    }

    /// Create a hunk header line.
    pub fn section(header: impl Into<String>) -> Self {
        Self::with_type(DiffLineType::Section, header, 0, 0)
    }

    fn with_type(
        line_type: DiffLineType,
        content: impl Into<String>,
        left_idx: u32,
        right_idx: u32,
    ) -> Self {
        Self {
            left_idx,
            right_idx,
            line_type,
            content: content.into(),
            comments: Vec::new(),
            match_idx: None,
            section_info: None,
        }
    }

    /// Whether a new comment may be started on this line.
    pub fn can_comment(&self) -> bool {
        self.comments.is_empty() && self.line_type != DiffLineType::Section
    }

    /// Side of the first attached comment.
    pub fn comment_side(&self) -> Option<CommentSide> {
        self.comments.first().map(CodeComment::side)
    }

    /// The leading `' '`, `'+'` or `'-'` of the content, if any.
    pub fn line_type_marker(&self) -> &str {
        match self.content.as_bytes().first() {
            Some(b' ' | b'+' | b'-') => &self.content[..1],
            _ => "",
        }
    }

    /// Content without its marker.
    pub fn payload(&self) -> &str {
        &self.content[self.line_type_marker().len()..]
    }

    /// CSS class used for this line in HTML output.
    pub fn html_line_type(&self) -> &'static str {
        self.line_type.html_class()
    }

    /// Which way the hidden lines above a section line can be expanded.
    pub fn expand_direction(&self) -> ExpandDirection {
        let Some(info) = self.section_info.as_ref() else {
            return ExpandDirection::None;
        };
        let gap = i64::from(info.right_idx) - i64::from(info.last_right_idx);
        if self.line_type != DiffLineType::Section || gap <= 1 {
            return ExpandDirection::None;
        }

        if info.last_left_idx == 0 && info.last_right_idx == 0 {
            ExpandDirection::Up
        } else if gap > i64::from(BLOB_EXCERPT_CHUNK_SIZE) && info.right_hunk_size > 0 {
            ExpandDirection::UpDown
        } else if info.left_hunk_size == 0 && info.right_hunk_size == 0 {
            ExpandDirection::Down
        } else {
            ExpandDirection::Single
        }
    }
}

/// Most lines revealed by one expansion step.
pub const BLOB_EXCERPT_CHUNK_SIZE: u32 = 20;

/// Where a section header sits relative to the previous hunk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffLineSectionInfo {
    pub path: String,
    /// Last old line of the previous hunk, 0 before the first hunk.
    pub last_left_idx: u32,
    /// Last new line of the previous hunk, 0 before the first hunk.
    pub last_right_idx: u32,
    pub left_idx: u32,
    pub right_idx: u32,
    pub left_hunk_size: u32,
    pub right_hunk_size: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpandDirection {
    None,
    Single,
    UpDown,
    Up,
    Down,
}

/// Line type in the diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffLineType {
    /// Unchanged line.
    Plain,
    /// Added line (+).
    Add,
    /// Removed line (-).
    Del,
    /// @@ header line.
    Section,
}

impl DiffLineType {
    pub fn html_class(&self) -> &'static str {
        match self {
            DiffLineType::Add => "add",
            DiffLineType::Del => "del",
            DiffLineType::Section => "tag",
            DiffLineType::Plain => "same",
        }
    }
}
