//! Extract the part of a single-file diff that leads up to a given line.
//!
//! Used to show a review comment with a few lines of context without
//! running the diff again.

use super::hunk_header::HunkHeader;

fn is_file_header(line: &str) -> bool {
    line.starts_with("diff --git ") || line.starts_with("---") || line.starts_with("+++")
}

/// Cut `diff` so that only `line` and up to `context_lines - 1` lines above
/// it remain, with a recomputed hunk header.
///
/// `old` selects which side `line` refers to. File header lines are kept.
/// Returns an empty string when `line` or `context_lines` is 0 or when no
/// hunk covers `line`. Only the first hunk covering `line` is used.
pub fn cut_diff_around_line(diff: &str, line: i64, old: bool, context_lines: usize) -> String {
    if line == 0 || context_lines == 0 {
        return String::new();
    }

    let mut hunk: Vec<&str> = Vec::new();
    let mut header_lines = 0;
    let mut seen_hunk = false;
    let mut found = false;
    // Position on the selected side, and on the opposite side.
    let mut current = 0i64;
    let mut other = 0i64;

    for lof in diff.lines() {
        if !seen_hunk && is_file_header(lof) {
            hunk.push(lof);
            header_lines += 1;
            continue;
        }
        if found && current > line {
            break;
        }

        if lof.starts_with("@@") {
            if found {
                break;
            }
            seen_hunk = true;
            let Some(header) = HunkHeader::parse(lof) else {
                log::debug!("skipping malformed hunk header {lof:?}");
                continue;
            };
            let (begin, count) = header.range(old);
            let (begin, end) = (i64::from(begin), i64::from(begin) + i64::from(count));
            if begin <= line && line < end {
                hunk.push(lof);
                current = begin;
                other = i64::from(if old { header.begin_new } else { header.begin_old });
                found = true;
            }
            continue;
        }

        if found {
            hunk.push(lof);
            match lof.as_bytes().first() {
                Some(b'+') if old => other += 1,
                Some(b'+') => current += 1,
                Some(b'-') if old => current += 1,
                Some(b'-') => other += 1,
                Some(b'\\') => {}
                _ => {
                    current += 1;
                    other += 1;
                }
            }
        }
    }

    if !found {
        return String::new();
    }

    // Everything after the file headers and the hunk header.
    if hunk.len() - header_lines - 1 <= context_lines {
        return hunk.join("\n");
    }

    let (mut old_begin, mut new_begin) = if old { (current, other) } else { (other, current) };
    let (mut old_count, mut new_count) = (0i64, 0i64);
    let kept = &hunk[hunk.len() - context_lines..];
    for lof in kept.iter().rev() {
        match lof.as_bytes().first() {
            Some(b'+') => {
                new_begin -= 1;
                new_count += 1;
            }
            Some(b'-') => {
                old_begin -= 1;
                old_count += 1;
            }
            Some(b'\\') => {}
            _ => {
                old_begin -= 1;
                new_begin -= 1;
                old_count += 1;
                new_count += 1;
            }
        }
    }

    let new_header = format!("@@ -{old_begin},{old_count} +{new_begin},{new_count} @@");
    let mut out: Vec<&str> = hunk[..header_lines].to_vec();
    out.push(&new_header);
    out.extend_from_slice(kept);
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const MIXED: &str = "diff --git a/f b/f
--- a/f
+++ b/f
@@ -10,8 +10,9 @@
 a
-b
+c
+d
 e
-f
+g
 h";

    #[test]
    fn test_zero_line_or_context() {
        assert_eq!(cut_diff_around_line(MIXED, 0, false, 3), "");
        assert_eq!(cut_diff_around_line(MIXED, 12, false, 0), "");
    }

    #[test]
    fn test_recomputes_header() {
        // New side: a=10 c=11 d=12 e=13 g=14 h=15. Old side: a=10 b=11 e=12 f=13 h=14.
        let cut = cut_diff_around_line(MIXED, 15, false, 3);
        assert_eq!(
            cut,
            "diff --git a/f b/f
--- a/f
+++ b/f
@@ -13,2 +14,2 @@
-f
+g
 h"
        );
    }

    #[test]
    fn test_recomputes_header_on_old_side() {
        let cut = cut_diff_around_line(MIXED, 12, true, 2);
        // Accumulation stops once the old side passes line 12, before "-f".
        assert_eq!(
            cut,
            "diff --git a/f b/f
--- a/f
+++ b/f
@@ -12,1 +12,2 @@
+d
 e"
        );
    }

    #[test]
    fn test_stops_after_target_line() {
        let cut = cut_diff_around_line(MIXED, 12, false, 2);
        assert_eq!(
            cut,
            "diff --git a/f b/f
--- a/f
+++ b/f
@@ -12,0 +11,2 @@
+c
+d"
        );
    }

    #[test]
    fn test_small_hunk_is_returned_unchanged() {
        let diff = "diff --git a/f b/f
--- a/f
+++ b/f
@@ -1,2 +1,3 @@
 one
+two
 three";
        assert_eq!(cut_diff_around_line(diff, 3, false, 4), diff);
        assert_eq!(cut_diff_around_line(diff, 3, false, 3), diff);
    }

    #[test]
    fn test_line_outside_all_hunks() {
        assert_eq!(cut_diff_around_line(MIXED, 100, false, 3), "");
        assert_eq!(cut_diff_around_line(MIXED, 5, true, 3), "");
    }

    #[test]
    fn test_picks_the_covering_hunk() {
        let diff = "--- a/f
+++ b/f
@@ -1,2 +1,2 @@
--- old dashes
+++ new pluses
 keep
@@ -20,3 +20,3 @@
 x
-y
+z
 w";
        let cut = cut_diff_around_line(diff, 22, false, 2);
        assert_eq!(
            cut,
            "--- a/f
+++ b/f
@@ -22,1 +21,2 @@
+z
 w"
        );
    }

    #[test]
    fn test_without_file_headers() {
        let diff = "@@ -1,3 +1,3 @@
 a
-b
+B
 c";
        assert_eq!(
            cut_diff_around_line(diff, 2, false, 5),
            "@@ -1,3 +1,3 @@
 a
-b
+B"
        );
        assert_eq!(
            cut_diff_around_line(diff, 2, true, 1),
            "@@ -2,1 +2,0 @@
-b"
        );
    }

    #[test]
    fn test_single_line_hunk_without_counts() {
        let diff = "@@ -7 +7 @@
-old
+new";
        assert_eq!(cut_diff_around_line(diff, 7, false, 3), diff);
        assert_eq!(cut_diff_around_line(diff, 8, false, 3), "");
    }
}
