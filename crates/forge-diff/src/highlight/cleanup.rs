//! Post-processing of character diffs for display.
//!
//! A raw character diff of two similar lines tends to be a patchwork of
//! one-character edits. The passes here merge adjacent edits and fold short
//! equalities that sit between edits into the edits, so the highlighted
//! spans stay readable. Lengths are counted in characters.

/// What a segment does to the old text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Equal,
    Insert,
    Delete,
}

/// A run of text with a single operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub op: Op,
    pub text: String,
}

impl Segment {
    pub fn new(op: Op, text: impl Into<String>) -> Self {
        Self {
            op,
            text: text.into(),
        }
    }
}

/// Byte length of the common prefix of `a` and `b`.
fn common_prefix(a: &str, b: &str) -> usize {
    a.chars()
        .zip(b.chars())
        .take_while(|(x, y)| x == y)
        .map(|(x, _)| x.len_utf8())
        .sum()
}

/// Byte length of the common suffix of `a` and `b`.
fn common_suffix(a: &str, b: &str) -> usize {
    a.chars()
        .rev()
        .zip(b.chars().rev())
        .take_while(|(x, y)| x == y)
        .map(|(x, _)| x.len_utf8())
        .sum()
}

/// Merge neighbouring segments of the same kind, move common affixes of
/// paired edits into the surrounding equalities, and slide single edits
/// sideways when that removes an equality.
pub fn cleanup_merge(diffs: &mut Vec<Segment>) {
    loop {
        merge_runs(diffs);
        if !shift_single_edits(diffs) {
            break;
        }
    }
}

fn merge_runs(diffs: &mut Vec<Segment>) {
    // Sentinel so the last run is flushed.
    diffs.push(Segment::new(Op::Equal, ""));
    let mut pointer = 0;
    let mut count_delete = 0;
    let mut count_insert = 0;
    let mut text_delete = String::new();
    let mut text_insert = String::new();

    while pointer < diffs.len() {
        match diffs[pointer].op {
            Op::Insert => {
                count_insert += 1;
                text_insert.push_str(&diffs[pointer].text);
                pointer += 1;
            }
            Op::Delete => {
                count_delete += 1;
                text_delete.push_str(&diffs[pointer].text);
                pointer += 1;
            }
            Op::Equal => {
                if count_delete + count_insert > 1 {
                    if count_delete != 0 && count_insert != 0 {
                        let prefix = common_prefix(&text_insert, &text_delete);
                        if prefix != 0 {
                            let first = pointer - count_delete - count_insert;
                            let common = text_insert[..prefix].to_string();
                            if first > 0 && diffs[first - 1].op == Op::Equal {
                                diffs[first - 1].text.push_str(&common);
                            } else {
                                diffs.insert(0, Segment::new(Op::Equal, common));
                                pointer += 1;
                            }
                            text_insert.drain(..prefix);
                            text_delete.drain(..prefix);
                        }

                        let suffix = common_suffix(&text_insert, &text_delete);
                        if suffix != 0 {
                            let insert_split = text_insert.len() - suffix;
                            let delete_split = text_delete.len() - suffix;
                            let mut text = text_insert.split_off(insert_split);
                            text.push_str(&diffs[pointer].text);
                            diffs[pointer].text = text;
                            text_delete.truncate(delete_split);
                        }
                    }

                    let start = pointer - count_delete - count_insert;
                    let mut merged = Vec::with_capacity(2);
                    if !text_delete.is_empty() {
                        merged.push(Segment::new(Op::Delete, std::mem::take(&mut text_delete)));
                    }
                    if !text_insert.is_empty() {
                        merged.push(Segment::new(Op::Insert, std::mem::take(&mut text_insert)));
                    }
                    let added = merged.len();
                    diffs.splice(start..pointer, merged);
                    pointer = start + added + 1;
                } else if pointer != 0 && diffs[pointer - 1].op == Op::Equal {
                    let text = diffs.remove(pointer).text;
                    diffs[pointer - 1].text.push_str(&text);
                } else {
                    pointer += 1;
                }
                count_insert = 0;
                count_delete = 0;
                text_delete.clear();
                text_insert.clear();
            }
        }
    }

    if diffs.last().is_some_and(|d| d.text.is_empty()) {
        diffs.pop();
    }
}

/// `A<ins>BA</ins>C` becomes `<ins>AB</ins>AC`, and the mirror image.
/// Returns whether anything moved.
fn shift_single_edits(diffs: &mut Vec<Segment>) -> bool {
    let mut changes = false;
    let mut pointer = 1;

    while pointer + 1 < diffs.len() {
        if diffs[pointer - 1].op == Op::Equal && diffs[pointer + 1].op == Op::Equal {
            let prev = diffs[pointer - 1].text.clone();
            let next = diffs[pointer + 1].text.clone();
            let current = &diffs[pointer].text;

            if !prev.is_empty() && current.ends_with(prev.as_str()) {
                let head = &current[..current.len() - prev.len()];
                diffs[pointer].text = format!("{prev}{head}");
                diffs[pointer + 1].text = format!("{prev}{next}");
                diffs.remove(pointer - 1);
                changes = true;
            } else if !next.is_empty() && current.starts_with(next.as_str()) {
                let tail = &current[next.len()..];
                diffs[pointer].text = format!("{tail}{next}");
                diffs[pointer - 1].text.push_str(&next);
                diffs.remove(pointer + 1);
                changes = true;
            }
        }
        pointer += 1;
    }
    changes
}

/// Fold short equalities between edits into the edits.
///
/// An equality shorter than `edit_cost` characters that is surrounded by
/// edits on all four sides, or one shorter than half of it with edits on
/// three sides, costs more to display than it saves and is replaced by a
/// delete and insert of the same text.
pub fn cleanup_efficiency(diffs: &mut Vec<Segment>, edit_cost: usize) {
    if diffs.is_empty() {
        return;
    }

    let mut changes = false;
    let mut equalities: Vec<usize> = Vec::new();
    let mut last_equality: Option<String> = None;
    let mut pointer: isize = 0;
    // Edits before and after the candidate equality.
    let mut pre_ins = false;
    let mut pre_del = false;
    let mut post_ins = false;
    let mut post_del = false;

    while (pointer as usize) < diffs.len() {
        let index = pointer as usize;
        if diffs[index].op == Op::Equal {
            if diffs[index].text.chars().count() < edit_cost && (post_ins || post_del) {
                equalities.push(index);
                pre_ins = post_ins;
                pre_del = post_del;
                last_equality = Some(diffs[index].text.clone());
            } else {
                equalities.clear();
                last_equality = None;
            }
            post_ins = false;
            post_del = false;
        } else {
            if diffs[index].op == Op::Delete {
                post_del = true;
            } else {
                post_ins = true;
            }

            let sides = [pre_ins, pre_del, post_ins, post_del]
                .iter()
                .filter(|&&b| b)
                .count();
            let fold = match &last_equality {
                Some(eq) => {
                    sides == 4 || (eq.chars().count() < edit_cost / 2 && sides == 3)
                }
                None => false,
            };

            if !fold {
                pointer += 1;
                continue;
            }
            if let (Some(eq), Some(at)) = (last_equality.take(), equalities.last().copied()) {
                diffs.insert(at, Segment::new(Op::Delete, eq));
                diffs[at + 1].op = Op::Insert;
                equalities.pop();
                if pre_ins && pre_del {
                    post_ins = true;
                    post_del = true;
                    equalities.clear();
                } else {
                    equalities.pop();
                    pointer = equalities.last().map_or(-1, |&i| i as isize);
                    post_ins = false;
                    post_del = false;
                }
                changes = true;
            }
        }
        pointer += 1;
    }

    if changes {
        cleanup_merge(diffs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn seg(op: Op, text: &str) -> Segment {
        Segment::new(op, text)
    }

    #[test]
    fn test_common_affixes() {
        assert_eq!(common_prefix("abcx", "abcy"), 3);
        assert_eq!(common_prefix("ab", "abc"), 2);
        assert_eq!(common_prefix("x", "y"), 0);
        assert_eq!(common_suffix("xabc", "yabc"), 3);
        assert_eq!(common_prefix("éa", "éb"), 2);
    }

    #[test]
    fn test_merge_adjacent() {
        let mut diffs = vec![
            seg(Op::Equal, "a"),
            seg(Op::Equal, "b"),
            seg(Op::Insert, "c"),
            seg(Op::Insert, "d"),
        ];
        cleanup_merge(&mut diffs);
        assert_eq!(diffs, vec![seg(Op::Equal, "ab"), seg(Op::Insert, "cd")]);
    }

    #[test]
    fn test_merge_interleaved_edits() {
        let mut diffs = vec![
            seg(Op::Delete, "a"),
            seg(Op::Insert, "b"),
            seg(Op::Delete, "c"),
            seg(Op::Insert, "d"),
            seg(Op::Equal, "e"),
        ];
        cleanup_merge(&mut diffs);
        assert_eq!(
            diffs,
            vec![seg(Op::Delete, "ac"), seg(Op::Insert, "bd"), seg(Op::Equal, "e")]
        );
    }

    #[test]
    fn test_merge_factors_out_affixes() {
        let mut diffs = vec![
            seg(Op::Equal, "x"),
            seg(Op::Delete, "abc"),
            seg(Op::Insert, "abXc"),
            seg(Op::Equal, "y"),
        ];
        cleanup_merge(&mut diffs);
        assert_eq!(
            diffs,
            vec![seg(Op::Equal, "xab"), seg(Op::Insert, "X"), seg(Op::Equal, "cy")]
        );
    }

    #[test]
    fn test_merge_prefix_without_leading_equality() {
        let mut diffs = vec![seg(Op::Delete, "ab"), seg(Op::Insert, "ac")];
        cleanup_merge(&mut diffs);
        assert_eq!(
            diffs,
            vec![seg(Op::Equal, "a"), seg(Op::Delete, "b"), seg(Op::Insert, "c")]
        );
    }

    #[test]
    fn test_slide_edit_left() {
        let mut diffs = vec![seg(Op::Equal, "a"), seg(Op::Insert, "ba"), seg(Op::Equal, "c")];
        cleanup_merge(&mut diffs);
        assert_eq!(diffs, vec![seg(Op::Insert, "ab"), seg(Op::Equal, "ac")]);
    }

    #[test]
    fn test_slide_edit_right() {
        let mut diffs = vec![seg(Op::Equal, "c"), seg(Op::Insert, "ab"), seg(Op::Equal, "a")];
        cleanup_merge(&mut diffs);
        assert_eq!(diffs, vec![seg(Op::Equal, "ca"), seg(Op::Insert, "ba")]);
    }

    #[test]
    fn test_efficiency_four_edit_sides() {
        let mut diffs = vec![
            seg(Op::Delete, "ab"),
            seg(Op::Insert, "12"),
            seg(Op::Equal, "xyz"),
            seg(Op::Delete, "cd"),
            seg(Op::Insert, "34"),
        ];
        cleanup_efficiency(&mut diffs, 4);
        assert_eq!(diffs, vec![seg(Op::Delete, "abxyzcd"), seg(Op::Insert, "12xyz34")]);
    }

    #[test]
    fn test_efficiency_keeps_long_equality() {
        let original = vec![
            seg(Op::Delete, "ab"),
            seg(Op::Insert, "12"),
            seg(Op::Equal, "wxyz"),
            seg(Op::Delete, "cd"),
            seg(Op::Insert, "34"),
        ];
        let mut diffs = original.clone();
        cleanup_efficiency(&mut diffs, 4);
        assert_eq!(diffs, original);
    }

    #[test]
    fn test_efficiency_three_edit_sides() {
        let mut diffs = vec![
            seg(Op::Insert, "12"),
            seg(Op::Equal, "x"),
            seg(Op::Delete, "cd"),
            seg(Op::Insert, "34"),
        ];
        cleanup_efficiency(&mut diffs, 4);
        assert_eq!(diffs, vec![seg(Op::Delete, "xcd"), seg(Op::Insert, "12x34")]);
    }

    #[test]
    fn test_efficiency_backpass() {
        let mut diffs = vec![
            seg(Op::Delete, "ab"),
            seg(Op::Insert, "12"),
            seg(Op::Equal, "xy"),
            seg(Op::Insert, "34"),
            seg(Op::Equal, "z"),
            seg(Op::Delete, "cd"),
            seg(Op::Insert, "56"),
        ];
        cleanup_efficiency(&mut diffs, 4);
        assert_eq!(
            diffs,
            vec![seg(Op::Delete, "abxyzcd"), seg(Op::Insert, "12xy34z56")]
        );
    }

    #[test]
    fn test_efficiency_empty() {
        let mut diffs = Vec::new();
        cleanup_efficiency(&mut diffs, 4);
        assert!(diffs.is_empty());
    }
}
