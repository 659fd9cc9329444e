//! Streaming parser for `git diff --patch` output.
//!
//! The input is read line by line straight from the underlying reader, so a
//! patch never has to be held in memory as a whole. Lines longer than the
//! configured limit are cut while reading.

use super::git_header;
use super::hunk_header::HunkHeader;
use crate::encoding::{normalize_lines, truncate_line};
use crate::model::{
    Diff, DiffFile, DiffFileType, DiffLine, DiffLineSectionInfo, DiffLineType, DiffSection,
};
use crate::traits::LfsObjectStore;
use std::io::{self, BufRead, BufReader, Read};
use thiserror::Error;

const DIFF_HEAD: &str = "diff --git ";
const LFS_POINTER_VERSION: &str = "version https://git-lfs.github.com/spec/v1";
const LFS_OID_PREFIX: &str = "oid sha256:";
const SUBMODULE_MODE: &str = " 160000";

/// Errors that abort parsing. No partial diff is returned with them.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Failed to read patch: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid quoted file name in header: {line}")]
    InvalidQuotedName { line: String },

    #[error("Unable to unquote {name}: {reason}")]
    Unquote { name: String, reason: String },
}

/// Bounds applied while parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseLimits {
    /// Content lines kept per file.
    pub max_lines: usize,
    /// Bytes kept per content line. The line marker is always kept.
    pub max_line_characters: usize,
    /// Files kept per diff.
    pub max_files: usize,
}

impl Default for ParseLimits {
    fn default() -> Self {
        Self {
            max_lines: 1000,
            max_line_characters: 5000,
            max_files: 100,
        }
    }
}

/// Parse a patch read from `reader`.
///
/// `lfs` decides which LFS pointer files are reported as LFS objects.
///
/// # Example
/// ```ignore
/// let diff = parse_patch(ParseLimits::default(), &NoLfsObjects, file)?;
/// println!("Changed files: {}", diff.num_files());
/// ```
pub fn parse_patch<R: Read>(
    limits: ParseLimits,
    lfs: &dyn LfsObjectStore,
    reader: R,
) -> Result<Diff, ParseError> {
    parse_patch_skip_to(limits, lfs, reader, None)
}

/// Parse a patch, ignoring every file before the one named `skip_to_file`.
///
/// Together with [`Diff::end`] this pages through a patch that is larger
/// than the file limit. When no file has that name the diff is empty.
pub fn parse_patch_skip_to<R: Read>(
    limits: ParseLimits,
    lfs: &dyn LfsObjectStore,
    reader: R,
    skip_to_file: Option<&str>,
) -> Result<Diff, ParseError> {
    let mut lines = LineReader::new(reader, limits.max_line_characters);
    let mut parser = PatchParser::new(limits, lfs, skip_to_file);

    while let Some(line) = lines.next_line(parser.in_hunk())? {
        if let Flow::Stop = parser.feed(line)? {
            lines.drain()?;
            break;
        }
    }

    let diff = parser.finish();
    log::debug!(
        "parsed patch: {} files, +{} -{}{}",
        diff.num_files(),
        diff.total_addition,
        diff.total_deletion,
        if diff.is_incomplete { " (incomplete)" } else { "" }
    );
    Ok(diff)
}

/// Parse a patch held in memory.
pub fn parse_patch_str(
    limits: ParseLimits,
    lfs: &dyn LfsObjectStore,
    patch: &str,
) -> Result<Diff, ParseError> {
    parse_patch(limits, lfs, patch.as_bytes())
}

/// One line of input without its terminator.
struct RawLine {
    bytes: Vec<u8>,
    /// Bytes past the character limit were dropped.
    truncated: bool,
}

struct LineReader<R> {
    inner: BufReader<R>,
    max_line_characters: usize,
}

/// Bytes read past the limit so that a cut through a UTF-8 character can be
/// recognized.
const LOOKAHEAD: usize = 3;

impl<R: Read> LineReader<R> {
    fn new(reader: R, max_line_characters: usize) -> Self {
        Self {
            inner: BufReader::new(reader),
            max_line_characters: max_line_characters.max(1),
        }
    }

    /// Read the next line. When `limited`, content past the character limit
    /// is dropped; file and hunk headers are always kept whole.
    fn next_line(&mut self, limited: bool) -> io::Result<Option<RawLine>> {
        let mut bytes = Vec::new();
        let mut overflow = false;
        let mut read_any = false;

        loop {
            let available = match self.inner.fill_buf() {
                Ok(buf) => buf,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            if available.is_empty() {
                break;
            }
            read_any = true;

            let newline = available.iter().position(|&b| b == b'\n');
            let chunk = &available[..newline.unwrap_or(available.len())];
            let cap = if limited && !is_header(&bytes, chunk) {
                self.max_line_characters
                    .saturating_add(LOOKAHEAD)
                    .max(DIFF_HEAD.len())
            } else {
                usize::MAX
            };
            let room = cap.saturating_sub(bytes.len());
            if chunk.len() > room {
                overflow = true;
            }
            bytes.extend_from_slice(&chunk[..chunk.len().min(room)]);

            let consumed = newline.map_or(available.len(), |pos| pos + 1);
            self.inner.consume(consumed);
            if newline.is_some() {
                break;
            }
        }

        if !read_any {
            return Ok(None);
        }
        if !overflow && bytes.last() == Some(&b'\r') {
            bytes.pop();
        }

        let mut truncated = false;
        if limited && !is_header(&bytes, &[]) && bytes.len() > self.max_line_characters {
            truncate_line(&mut bytes, self.max_line_characters);
            truncated = true;
        }
        Ok(Some(RawLine { bytes, truncated }))
    }

    /// Consume the rest of the input.
    fn drain(&mut self) -> io::Result<u64> {
        io::copy(&mut self.inner, &mut io::sink())
    }
}

/// Whether the line starting with `bytes` followed by `chunk` is a file or
/// hunk header.
fn is_header(bytes: &[u8], chunk: &[u8]) -> bool {
    let starts_with = |prefix: &[u8]| {
        bytes
            .iter()
            .chain(chunk)
            .take(prefix.len())
            .eq(prefix.iter())
    };
    starts_with(DIFF_HEAD.as_bytes()) || starts_with(b"@@")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// No file has started yet.
    ExpectFileOrHunkHeader,
    /// Between `diff --git` and the first `@@`.
    InFileHeaderBlock,
    InHunk,
}

enum Flow {
    Continue,
    Stop,
}

struct PatchParser<'a> {
    limits: ParseLimits,
    lfs: &'a dyn LfsObjectStore,
    state: State,
    diff: Diff,
    current: Option<FileDraft>,
    /// Cleared once the file is found.
    skip_to: Option<String>,
}

impl<'a> PatchParser<'a> {
    fn new(limits: ParseLimits, lfs: &'a dyn LfsObjectStore, skip_to: Option<&str>) -> Self {
        let skip_to = skip_to.map(str::to_string);
        Self {
            limits,
            lfs,
            state: State::ExpectFileOrHunkHeader,
            diff: Diff {
                start: skip_to.clone(),
                ..Diff::new()
            },
            current: None,
            skip_to,
        }
    }

    fn feed(&mut self, line: RawLine) -> Result<Flow, ParseError> {
        if line.bytes.starts_with(DIFF_HEAD.as_bytes()) {
            self.finish_file();
            let header = String::from_utf8_lossy(&line.bytes);
            let rest = &header[DIFF_HEAD.len()..];

            if self.diff.files.len() >= self.limits.max_files {
                log::debug!("file limit of {} reached", self.limits.max_files);
                self.diff.is_incomplete = true;
                self.diff.end = git_header::parse_file_names(rest, &header)
                    .ok()
                    .map(|names| names.name);
                return Ok(Flow::Stop);
            }

            let names = git_header::parse_file_names(rest, &header)?;
            if let Some(target) = self.skip_to.as_deref() {
                if names.name != target {
                    log::debug!("skipping {} on the way to {}", names.name, target);
                    self.state = State::ExpectFileOrHunkHeader;
                    return Ok(Flow::Continue);
                }
                self.skip_to = None;
            }

            self.current = Some(FileDraft::new(self.diff.files.len() + 1, names));
            self.state = State::InFileHeaderBlock;
            return Ok(Flow::Continue);
        }

        let Some(draft) = self.current.as_mut() else {
            if self.skip_to.is_none() {
                log::debug!("ignoring line outside of a file");
            }
            return Ok(Flow::Continue);
        };

        if line.truncated {
            draft.file.is_incomplete = true;
            draft.file.is_incomplete_line_too_long = true;
        }

        match self.state {
            State::ExpectFileOrHunkHeader => {}
            State::InFileHeaderBlock if line.bytes.starts_with(b"@@") => {
                self.state = State::InHunk;
                draft.hunk_line(line, &self.limits, self.lfs);
            }
            State::InFileHeaderBlock => draft.header_line(&line.bytes)?,
            State::InHunk => draft.hunk_line(line, &self.limits, self.lfs),
        }
        Ok(Flow::Continue)
    }

    fn in_hunk(&self) -> bool {
        self.state == State::InHunk
    }

    fn finish_file(&mut self) {
        if let Some(draft) = self.current.take() {
            self.diff.files.push(draft.finish());
        }
    }

    fn finish(mut self) -> Diff {
        self.finish_file();
        self.diff.recalculate_totals();
        self.diff
    }
}

/// A file whose lines are still being collected.
struct FileDraft {
    file: DiffFile,
    /// Raw bytes of the content lines of each section, the section header
    /// excluded. Decoded once the file is complete.
    raw: Vec<Vec<Vec<u8>>>,
    left_line: u32,
    right_line: u32,
    line_count: usize,
    /// Cleared for binary and LFS files.
    collecting: bool,
    lfs_pointer: bool,
    ambiguous: bool,
    /// First deletion of the run waiting for additions to pair with.
    pending_deletion: Option<usize>,
}

impl FileDraft {
    fn new(index: usize, names: git_header::FileNames) -> Self {
        Self {
            file: DiffFile::new(index, names.old_name, names.name),
            raw: Vec::new(),
            left_line: 1,
            right_line: 1,
            line_count: 0,
            collecting: true,
            lfs_pointer: false,
            ambiguous: names.ambiguous,
            pending_deletion: None,
        }
    }

    fn header_line(&mut self, bytes: &[u8]) -> Result<(), ParseError> {
        let text = String::from_utf8_lossy(bytes);
        let text = text.as_ref();
        let file = &mut self.file;
        let submodule = text.ends_with(SUBMODULE_MODE);

        if let Some(value) = text.strip_prefix("rename from ") {
            file.old_name = git_header::read_name(value, text)?;
            file.file_type = DiffFileType::Rename;
            file.is_renamed = true;
        } else if let Some(value) = text.strip_prefix("rename to ") {
            file.name = git_header::read_name(value, text)?;
            file.file_type = DiffFileType::Rename;
            file.is_renamed = true;
            self.ambiguous = false;
        } else if let Some(value) = text.strip_prefix("copy from ") {
            file.old_name = git_header::read_name(value, text)?;
            file.file_type = DiffFileType::Copy;
            file.is_renamed = true;
        } else if let Some(value) = text.strip_prefix("copy to ") {
            file.name = git_header::read_name(value, text)?;
            file.file_type = DiffFileType::Copy;
            file.is_renamed = true;
            self.ambiguous = false;
        } else if text.starts_with("old mode ") || text.starts_with("new mode ") {
            file.is_submodule |= submodule;
        } else if text.starts_with("new file") {
            file.file_type = DiffFileType::Add;
            file.is_created = true;
            file.is_submodule |= submodule;
        } else if text.starts_with("deleted") {
            file.file_type = DiffFileType::Delete;
            file.is_deleted = true;
            file.is_submodule |= submodule;
        } else if text.starts_with("similarity index 100%") {
            file.file_type = DiffFileType::Rename;
        } else if text.starts_with("index") {
            file.is_submodule |= submodule;
        } else if text.starts_with("Binary") {
            file.is_bin = true;
            self.collecting = false;
        } else if let Some(path) = text.strip_prefix("--- ") {
            if self.ambiguous {
                file.old_name = path
                    .strip_prefix("a/")
                    .map(|p| p.trim_end_matches('\t').to_string())
                    .unwrap_or_default();
            }
        } else if let Some(path) = text.strip_prefix("+++ ") {
            if self.ambiguous {
                match path.strip_prefix("b/") {
                    Some(p) => {
                        file.name = p.trim_end_matches('\t').to_string();
                        if file.old_name.is_empty() {
                            file.old_name = file.name.clone();
                        }
                    }
                    None => file.name = file.old_name.clone(),
                }
                file.is_renamed = file.old_name != file.name;
                self.ambiguous = false;
            }
        } else if !text.is_empty() {
            log::debug!("ignoring file header line {text:?}");
        }
        Ok(())
    }

    fn hunk_line(&mut self, line: RawLine, limits: &ParseLimits, lfs: &dyn LfsObjectStore) {
        let Some(&marker) = line.bytes.first() else {
            log::debug!("ignoring empty line in hunk of {}", self.file.name);
            return;
        };

        match marker {
            b'@' if line.bytes.starts_with(b"@@") => self.start_section(line.bytes, limits),
            // `\ No newline at end of file`
            b'\\' => {}
            b'+' => {
                self.line_count += 1;
                self.file.addition += 1;
                if self.accepts_line(limits) {
                    let content = DiffLine::addition(String::new(), self.right_line);
                    self.push_line(content, line.bytes, lfs);
                }
                self.right_line += 1;
            }
            b'-' => {
                self.line_count += 1;
                self.file.deletion += 1;
                if self.accepts_line(limits) {
                    let content = DiffLine::deletion(String::new(), self.left_line);
                    self.push_line(content, line.bytes, lfs);
                }
                if self.left_line > 0 {
                    self.left_line += 1;
                }
            }
            b' ' => {
                self.line_count += 1;
                if self.accepts_line(limits) {
                    let content = DiffLine::plain(String::new(), self.left_line, self.right_line);
                    self.push_line(content, line.bytes, lfs);
                }
                self.left_line += 1;
                self.right_line += 1;
            }
            _ if line.bytes.starts_with(b"Binary") => {
                self.file.is_bin = true;
                self.collecting = false;
            }
            _ => log::debug!(
                "ignoring unexpected hunk line {:?}",
                String::from_utf8_lossy(&line.bytes)
            ),
        }
    }

    fn start_section(&mut self, bytes: Vec<u8>, limits: &ParseLimits) {
        if self.line_count >= limits.max_lines {
            self.file.is_incomplete = true;
            return;
        }

        let header = String::from_utf8_lossy(&bytes).into_owned();
        let range = HunkHeader::parse_lenient(&header);
        let (left_idx, left_hunk_size) = range.range(true);
        let (right_idx, right_hunk_size) = range.range(false);
        let info = DiffLineSectionInfo {
            path: self.file.name.clone(),
            last_left_idx: self.left_line.saturating_sub(1),
            last_right_idx: self.right_line.saturating_sub(1),
            left_idx,
            right_idx,
            left_hunk_size,
            right_hunk_size,
        };
        self.left_line = left_idx;
        self.right_line = right_idx;
        self.pending_deletion = None;

        if self.collecting {
            let mut line = DiffLine::section(header.clone());
            line.section_info = Some(info);
            self.file.sections.push(DiffSection {
                name: header,
                file_name: self.file.name.clone(),
                lines: vec![line],
            });
            self.raw.push(Vec::new());
        }
    }

    fn accepts_line(&mut self, limits: &ParseLimits) -> bool {
        if self.line_count >= limits.max_lines {
            self.file.is_incomplete = true;
            return false;
        }
        self.collecting
    }

    fn push_line(&mut self, mut line: DiffLine, bytes: Vec<u8>, lfs: &dyn LfsObjectStore) {
        let (Some(section), Some(raw)) = (self.file.sections.last_mut(), self.raw.last_mut())
        else {
            return;
        };

        let payload = String::from_utf8_lossy(&bytes);
        let trimmed = payload.trim_matches(|c: char| c == '+' || c == '-' || c == ' ');
        let mut is_lfs_object = false;
        if trimmed == LFS_POINTER_VERSION {
            self.lfs_pointer = true;
        } else if self.lfs_pointer {
            if let Some(oid) = trimmed.strip_prefix(LFS_OID_PREFIX) {
                is_lfs_object = oid.len() == 64 && lfs.contains(oid);
            }
        }

        if is_lfs_object {
            log::debug!("{} is an LFS pointer", self.file.name);
            self.file.is_bin = true;
            self.file.is_lfs_file = true;
            self.collecting = false;
            self.pending_deletion = None;
            section.lines.truncate(1);
            raw.clear();
            return;
        }

        let position = section.lines.len();
        match line.line_type {
            DiffLineType::Del => {
                if section.lines[position - 1].line_type != DiffLineType::Del {
                    self.pending_deletion = Some(position);
                }
            }
            DiffLineType::Add => {
                if let Some(deletion) = self.pending_deletion {
                    line.match_idx = Some(deletion);
                    section.lines[deletion].match_idx = Some(position);
                    let next = deletion + 1;
                    self.pending_deletion = (next < position
                        && section.lines[next].line_type == DiffLineType::Del)
                        .then_some(next);
                }
            }
            DiffLineType::Plain | DiffLineType::Section => self.pending_deletion = None,
        }

        section.lines.push(line);
        raw.push(bytes);
    }

    fn finish(mut self) -> DiffFile {
        let raw: Vec<Vec<u8>> = self.raw.into_iter().flatten().collect();
        let mut decoded = normalize_lines(&raw).into_iter();

        for line in self
            .file
            .sections
            .iter_mut()
            .flat_map(|s| s.lines.iter_mut().skip(1))
        {
            if let Some(content) = decoded.next() {
                line.content = content;
            }
        }
        self.file
    }
}
