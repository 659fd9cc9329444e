//! Parsing of `@@ -a,b +c,d @@` hunk headers.

use regex::Regex;
use std::sync::OnceLock;

/// The line ranges announced by a hunk header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HunkHeader {
    /// First line on the old side.
    pub begin_old: u32,
    /// Number of old lines, `None` when the header omits it.
    pub end_old: Option<u32>,
    /// First line on the new side.
    pub begin_new: u32,
    /// Number of new lines, `None` when the header omits it.
    pub end_new: Option<u32>,
}

impl HunkHeader {
    /// Parse a well-formed header line. Trailing section text after the
    /// closing `@@` is allowed.
    pub fn parse(line: &str) -> Option<Self> {
        static HUNK_HEADER_REGEX: OnceLock<Regex> = OnceLock::new();

        let re = HUNK_HEADER_REGEX.get_or_init(|| {
            Regex::new(
                r"^@@ -(?P<beginOld>[0-9]+)(,(?P<endOld>[0-9]+))? \+(?P<beginNew>[0-9]+)(,(?P<endNew>[0-9]+))? @@",
            )
            .unwrap()
        });

        let caps = re.captures(line)?;
        let number = |name: &str| caps.name(name).map(|m| m.as_str().parse::<u32>());

        Some(Self {
            begin_old: number("beginOld")?.ok()?,
            end_old: number("endOld").transpose().ok()?,
            begin_new: number("beginNew")?.ok()?,
            end_new: number("endNew").transpose().ok()?,
        })
    }

    /// Parse a header, reading what it can from a malformed one.
    ///
    /// The fallback takes the first number after `-` as the old start and the
    /// first number after `+` as the new start; a missing new range reuses the
    /// old start.
    pub fn parse_lenient(line: &str) -> Self {
        if let Some(header) = Self::parse(line) {
            return header;
        }

        let mut tokens = line.trim_start_matches('@').split_whitespace();
        let begin_old = tokens
            .next()
            .and_then(|t| leading_number(t.trim_start_matches('-')))
            .unwrap_or(0);
        let begin_new = match tokens.next().and_then(|t| t.strip_prefix('+')) {
            Some(t) => leading_number(t).unwrap_or(begin_old),
            None => {
                log::warn!("hunk header {line:?} has no new range, reusing the old start");
                begin_old
            }
        };

        log::warn!("malformed hunk header {line:?}");
        Self {
            begin_old,
            end_old: None,
            begin_new,
            end_new: None,
        }
    }

    /// Start and count of the selected side. A missing count means one line.
    pub fn range(&self, old: bool) -> (u32, u32) {
        if old {
            (self.begin_old, self.end_old.unwrap_or(1))
        } else {
            (self.begin_new, self.end_new.unwrap_or(1))
        }
    }
}

fn leading_number(token: &str) -> Option<u32> {
    token.split(',').next()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_full_header() {
        let header = HunkHeader::parse("@@ -10,7 +12,8 @@ fn main() {").unwrap();
        assert_eq!(
            header,
            HunkHeader {
                begin_old: 10,
                end_old: Some(7),
                begin_new: 12,
                end_new: Some(8),
            }
        );
    }

    #[test]
    fn test_parse_omitted_counts() {
        let header = HunkHeader::parse("@@ -1 +1 @@").unwrap();
        assert_eq!(header.end_old, None);
        assert_eq!(header.end_new, None);
        assert_eq!(header.range(true), (1, 1));
        assert_eq!(header.range(false), (1, 1));
    }

    #[test]
    fn test_parse_new_file_header() {
        let header = HunkHeader::parse("@@ -0,0 +1,3 @@").unwrap();
        assert_eq!(header.range(true), (0, 0));
        assert_eq!(header.range(false), (1, 3));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(HunkHeader::parse("@@ -1,2 @@").is_none());
        assert!(HunkHeader::parse("@@ garbage @@").is_none());
        assert!(HunkHeader::parse(" @@ -1 +1 @@").is_none());
        assert!(HunkHeader::parse("@@ -99999999999 +1 @@").is_none());
    }

    #[test]
    fn test_parse_lenient_missing_new_range() {
        let header = HunkHeader::parse_lenient("@@ -5,3 @@");
        assert_eq!(header.begin_old, 5);
        assert_eq!(header.begin_new, 5);
    }

    #[test]
    fn test_parse_lenient_garbage() {
        let header = HunkHeader::parse_lenient("@@");
        assert_eq!(header.begin_old, 0);
        assert_eq!(header.begin_new, 0);
    }

    #[test]
    fn test_parse_lenient_prefers_strict() {
        let header = HunkHeader::parse_lenient("@@ -3,2 +4,5 @@");
        assert_eq!(header.range(false), (4, 5));
    }
}
