//! File names from `diff --git` header lines.
//!
//! Git prints both paths after `diff --git `, each with an `a/` or `b/`
//! prefix and C-quoted when it contains unusual characters. Unquoted paths
//! that contain ` b/` themselves cannot always be split reliably; such
//! headers are reported as ambiguous so that later extended headers can
//! supply the names.

use super::ParseError;

/// The two paths announced by a `diff --git` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNames {
    pub old_name: String,
    pub name: String,
    /// The split point was a guess.
    pub ambiguous: bool,
}

const SEPARATORS: [&str; 4] = ["b/", "\\b/", "\"b/", "\"\\b/"];

/// Split the text following `diff --git ` into old and new paths.
///
/// `header` is the full line, used for error messages only.
pub fn parse_file_names(rest: &str, header: &str) -> Result<FileNames, ParseError> {
    let rest = rest.trim_end_matches(['\n', '\r']);

    if rest.starts_with('"') {
        let (old, remainder) = unquote_prefix(rest, header)?;
        let new = read_name(remainder.trim_start(), header)?;
        return Ok(FileNames {
            old_name: strip_prefix(&old).to_string(),
            name: strip_prefix(&new).to_string(),
            ambiguous: false,
        });
    }

    if let Some(name) = split_at_midpoint(rest) {
        return Ok(FileNames {
            old_name: name.to_string(),
            name: name.to_string(),
            ambiguous: false,
        });
    }

    let candidates: Vec<usize> = rest
        .match_indices(' ')
        .map(|(i, _)| i)
        .filter(|&i| SEPARATORS.iter().any(|sep| rest[i + 1..].starts_with(sep)))
        .collect();

    let Some(&split) = candidates.first() else {
        log::warn!("no new path separator in {header:?}");
        let name = strip_prefix(rest).to_string();
        return Ok(FileNames {
            old_name: name.clone(),
            name,
            ambiguous: true,
        });
    };

    let new = read_name(&rest[split + 1..], header)?;
    Ok(FileNames {
        old_name: strip_prefix(&rest[..split]).to_string(),
        name: strip_prefix(&new).to_string(),
        ambiguous: candidates.len() > 1,
    })
}

/// Read a path that may be quoted. Used for `rename from` style values.
pub fn read_name(text: &str, header: &str) -> Result<String, ParseError> {
    if text.starts_with('"') {
        let (name, remainder) = unquote_prefix(text, header)?;
        if !remainder.trim().is_empty() {
            log::debug!("ignoring trailing text after quoted path in {header:?}");
        }
        Ok(name)
    } else {
        Ok(text.to_string())
    }
}

/// Unquote the C-style quoted string at the start of `text`.
///
/// Returns the decoded value and whatever follows the closing quote.
pub fn unquote_prefix<'a>(text: &'a str, header: &str) -> Result<(String, &'a str), ParseError> {
    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 1;

    while i < bytes.len() {
        match bytes[i] {
            b'"' => {
                let value = String::from_utf8(out)
                    .unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned());
                return Ok((value, &text[i + 1..]));
            }
            b'\\' => {
                let Some(&escaped) = bytes.get(i + 1) else {
                    break;
                };
                i += 2;
                let byte = match escaped {
                    b'a' => 0x07,
                    b'b' => 0x08,
                    b'f' => 0x0c,
                    b'n' => b'\n',
                    b'r' => b'\r',
                    b't' => b'\t',
                    b'v' => 0x0b,
                    b'\\' | b'"' => escaped,
                    b'0'..=b'7' => {
                        let mut value = u32::from(escaped - b'0');
                        let mut digits = 1;
                        while digits < 3 {
                            match bytes.get(i) {
                                Some(&d @ b'0'..=b'7') => {
                                    value = value * 8 + u32::from(d - b'0');
                                    i += 1;
                                    digits += 1;
                                }
                                _ => break,
                            }
                        }
                        u8::try_from(value).map_err(|_| ParseError::Unquote {
                            name: text.to_string(),
                            reason: format!("octal escape \\{value:o} out of range"),
                        })?
                    }
                    other => {
                        return Err(ParseError::Unquote {
                            name: text.to_string(),
                            reason: format!("unknown escape \\{}", char::from(other)),
                        })
                    }
                };
                out.push(byte);
                continue;
            }
            other => out.push(other),
        }
        i += 1;
    }

    Err(ParseError::InvalidQuotedName {
        line: header.to_string(),
    })
}

/// Drop the `a/` or `b/` prefix, and the backslash git leaves in front of
/// it for `--src-prefix=\a/`.
fn strip_prefix(name: &str) -> &str {
    let name = name.strip_prefix('\\').unwrap_or(name);
    name.get(2..).unwrap_or("")
}

/// `a/x b/x` where both halves name the same path.
fn split_at_midpoint(rest: &str) -> Option<&str> {
    if rest.len() % 2 == 0 {
        return None;
    }
    let mid = rest.len() / 2;
    if rest.as_bytes()[mid] != b' ' {
        return None;
    }
    let old = rest.get(..mid)?.strip_prefix("a/")?;
    let new = rest.get(mid + 1..)?.strip_prefix("b/")?;
    (old == new).then_some(old)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn names(rest: &str) -> FileNames {
        parse_file_names(rest, rest).unwrap()
    }

    #[test]
    fn test_simple_names() {
        let names = names("a/src/main.rs b/src/main.rs");
        assert_eq!(names.old_name, "src/main.rs");
        assert_eq!(names.name, "src/main.rs");
        assert!(!names.ambiguous);
    }

    #[test]
    fn test_renamed_names() {
        let names = names("a/old.rs b/new.rs\n");
        assert_eq!(names.old_name, "old.rs");
        assert_eq!(names.name, "new.rs");
    }

    #[test]
    fn test_quoted_names_with_escapes() {
        let names = names(r#""a/A \\ B" "b/A \\ B""#);
        assert_eq!(names.old_name, "A \\ B");
        assert_eq!(names.name, "A \\ B");
    }

    #[test]
    fn test_backslash_prefix_is_removed() {
        let names = names(r#""\\a/README.md" "\\b/README.md""#);
        assert_eq!(names.old_name, "README.md");
        assert_eq!(names.name, "README.md");
    }

    #[test]
    fn test_octal_escapes() {
        let names = names(r#""a/\360\243\220\265b\342\200\240vs" "b/a\342\200\224as""#);
        assert_eq!(names.old_name, "𣐵b†vs");
        assert_eq!(names.name, "a—as");
    }

    #[test]
    fn test_ambiguous_identical_halves() {
        let names = names("a/b b/b b/b b/b");
        assert_eq!(names.old_name, "b b/b");
        assert_eq!(names.name, "b b/b");
        assert!(!names.ambiguous);
    }

    #[test]
    fn test_ambiguous_different_halves() {
        let names = names("a/b b/b b/b b/b b/c");
        assert!(names.ambiguous);
    }

    #[test]
    fn test_missing_separator_degrades() {
        let names = names("a/only-one-path");
        assert_eq!(names.name, "only-one-path");
        assert!(names.ambiguous);

        let names = super::parse_file_names("", "diff --git ").unwrap();
        assert_eq!(names.name, "");
    }

    #[test]
    fn test_unterminated_quote_is_an_error() {
        let err = parse_file_names("\"0", "diff --git \"0").unwrap_err();
        assert!(matches!(err, ParseError::InvalidQuotedName { .. }));
    }

    #[test]
    fn test_unknown_escape_is_an_error() {
        let err = parse_file_names(r#""a/\q" "b/x""#, "h").unwrap_err();
        assert!(matches!(err, ParseError::Unquote { .. }));
    }

    #[test]
    fn test_read_name() {
        assert_eq!(read_name("plain name", "h").unwrap(), "plain name");
        assert_eq!(read_name(r#""tab\there""#, "h").unwrap(), "tab\there");
    }
}
