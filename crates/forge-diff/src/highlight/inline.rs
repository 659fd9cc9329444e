//! Character-level highlighting of changed lines.

use super::cleanup::{cleanup_efficiency, cleanup_merge, Op, Segment};
use crate::model::{DiffLine, DiffLineType, DiffSection};
use serde::Serialize;
use similar::{Algorithm, ChangeTag, TextDiff};
use std::fmt;
use std::time::Duration;

const ADDED_CODE_PREFIX: &str = r#"<span class="added-code">"#;
const REMOVED_CODE_PREFIX: &str = r#"<span class="removed-code">"#;
const CODE_TAG_SUFFIX: &str = "</span>";

/// HTML that has already been escaped and may be embedded as is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SafeHtml(String);

impl SafeHtml {
    /// Escape `text` into markup. Only `& < > " '` are replaced.
    pub fn escape(text: &str) -> Self {
        Self(html_escape::encode_quoted_attribute(text).into_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SafeHtml {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Escape a line for display; an empty line becomes a line break.
pub fn get_line_content(content: &str) -> SafeHtml {
    if content.is_empty() {
        SafeHtml("<br>".to_string())
    } else {
        SafeHtml::escape(content)
    }
}

/// Settings of an [`IntralineDiffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntralineOptions {
    /// Equalities shorter than this between edits are folded into the edits.
    pub edit_cost: usize,
    /// Upper bound for a single character diff.
    pub timeout: Duration,
    /// When off, lines are rendered without intraline spans.
    pub enabled: bool,
}

impl Default for IntralineOptions {
    fn default() -> Self {
        Self {
            edit_cost: 100,
            timeout: Duration::from_secs(1),
            enabled: true,
        }
    }
}

/// Renders a changed line with its differences to the paired line marked up.
///
/// Built once and shared; rendering does not mutate it.
#[derive(Debug, Clone, Default)]
pub struct IntralineDiffer {
    options: IntralineOptions,
}

impl IntralineDiffer {
    pub fn new(options: IntralineOptions) -> Self {
        Self { options }
    }

    /// Render `line` of `section`.
    ///
    /// An added line is compared with the deleted line it replaces and vice
    /// versa. Every other line is rendered escaped without its first
    /// character, so a section header loses one of its leading `@`.
    pub fn computed_inline_diff_for(&self, section: &DiffSection, line: &DiffLine) -> SafeHtml {
        let compare = match line.line_type {
            DiffLineType::Add => section.get_line(DiffLineType::Del, line.right_idx),
            DiffLineType::Del => section.get_line(DiffLineType::Add, line.left_idx),
            DiffLineType::Plain | DiffLineType::Section => None,
        };

        let Some(compare) = compare.filter(|_| self.options.enabled) else {
            return get_line_content(displayed(line));
        };

        let (deleted, added) = match line.line_type {
            DiffLineType::Add => (compare, line),
            _ => (line, compare),
        };
        let segments = self.diff_texts(deleted.payload(), added.payload());
        render(&segments, line.line_type)
    }

    /// Character diff from `old` to `new`, cleaned up for display.
    pub fn diff_texts(&self, old: &str, new: &str) -> Vec<Segment> {
        let diff = TextDiff::configure()
            .algorithm(Algorithm::Myers)
            .timeout(self.options.timeout)
            .diff_chars(old, new);

        let mut segments: Vec<Segment> = Vec::new();
        for change in diff.iter_all_changes() {
            let op = match change.tag() {
                ChangeTag::Equal => Op::Equal,
                ChangeTag::Insert => Op::Insert,
                ChangeTag::Delete => Op::Delete,
            };
            match segments.last_mut() {
                Some(last) if last.op == op => last.text.push_str(change.value()),
                _ => segments.push(Segment::new(op, change.value())),
            }
        }

        cleanup_merge(&mut segments);
        cleanup_efficiency(&mut segments, self.options.edit_cost);
        segments
    }
}

fn displayed(line: &DiffLine) -> &str {
    match line.line_type {
        DiffLineType::Section => line.content.get(1..).unwrap_or_default(),
        _ => line.payload(),
    }
}

fn render(segments: &[Segment], line_type: DiffLineType) -> SafeHtml {
    let mut html = String::new();
    for segment in segments {
        match (segment.op, line_type) {
            (Op::Equal, _) => html.push_str(get_line_content(&segment.text).as_str()),
            (Op::Insert, DiffLineType::Add) => {
                html.push_str(ADDED_CODE_PREFIX);
                html.push_str(get_line_content(&segment.text).as_str());
                html.push_str(CODE_TAG_SUFFIX);
            }
            (Op::Delete, DiffLineType::Del) => {
                html.push_str(REMOVED_CODE_PREFIX);
                html.push_str(get_line_content(&segment.text).as_str());
                html.push_str(CODE_TAG_SUFFIX);
            }
            _ => {}
        }
    }
    SafeHtml(html)
}
