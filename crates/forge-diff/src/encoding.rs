//! Charset detection and transcoding of diff lines to UTF-8.
//!
//! Lines of one file are sniffed together, since a single line rarely carries
//! enough signal for a reliable guess.

use chardetng::EncodingDetector;
use encoding_rs::UTF_8;

/// Convert the raw lines of one file to UTF-8 strings.
///
/// Valid UTF-8 input is returned unchanged. Otherwise the encoding is guessed
/// from all lines and each line is transcoded; a line that does not decode
/// cleanly keeps its original bytes, converted lossily.
pub fn normalize_lines(raw: &[Vec<u8>]) -> Vec<String> {
    if raw.iter().all(|line| std::str::from_utf8(line).is_ok()) {
        return raw
            .iter()
            .map(|line| String::from_utf8_lossy(line).into_owned())
            .collect();
    }

    let mut detector = EncodingDetector::new();
    let last = raw.len().saturating_sub(1);
    for (i, line) in raw.iter().enumerate() {
        detector.feed(line, i == last);
    }
    let encoding = detector.guess(None, true);
    log::debug!("transcoding diff lines from {}", encoding.name());

    raw.iter()
        .map(|line| {
            if encoding == UTF_8 {
                return String::from_utf8_lossy(line).into_owned();
            }
            match encoding.decode_without_bom_handling_and_without_replacement(line) {
                Some(decoded) => decoded.into_owned(),
                None => String::from_utf8_lossy(line).into_owned(),
            }
        })
        .collect()
}

/// Cut `bytes` down to `limit` bytes.
///
/// When the cut splits a UTF-8 character whose remaining bytes are present
/// past `limit`, the leading bytes of that character are dropped as well.
/// Anything else is kept as is, so bytes of a legacy encoding survive until
/// the charset is known.
pub(crate) fn truncate_line(bytes: &mut Vec<u8>, limit: usize) {
    if bytes.len() <= limit {
        return;
    }
    let start = utf8_char_start(bytes, limit);
    if start < limit {
        let window = &bytes[start..bytes.len().min(start + 4)];
        let valid = match std::str::from_utf8(window) {
            Ok(_) => window.len(),
            Err(err) => err.valid_up_to(),
        };
        if valid > limit - start {
            bytes.truncate(start);
            return;
        }
    }
    bytes.truncate(limit);
}

/// Start of the character that contains byte `at`, looking back over at
/// most three continuation bytes.
fn utf8_char_start(bytes: &[u8], at: usize) -> usize {
    let mut start = at;
    while start > 0 && at - start < 3 && is_continuation(bytes[start]) {
        start -= 1;
    }
    if is_continuation(bytes[start]) {
        at
    } else {
        start
    }
}

fn is_continuation(byte: u8) -> bool {
    byte & 0xC0 == 0x80
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_utf8_passthrough() {
        let raw = vec![b"+caf\xc3\xa9".to_vec(), b" plain".to_vec()];
        assert_eq!(normalize_lines(&raw), vec!["+café", " plain"]);
    }

    #[test]
    fn test_latin1_is_transcoded() {
        let raw = vec![
            b"+caf\xe9 cr\xe8me br\xfbl\xe9e".to_vec(),
            b"-na\xefve fa\xe7ade".to_vec(),
            b" d\xe9j\xe0 vu".to_vec(),
        ];
        let lines = normalize_lines(&raw);

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("+caf"));
        assert!(lines[1].starts_with("-na"));
        assert!(lines.iter().all(|l| !l.contains('\u{FFFD}')));
    }

    #[test]
    fn test_empty_input() {
        assert!(normalize_lines(&[]).is_empty());
    }

    #[test]
    fn test_truncate_inside_utf8_character() {
        let mut bytes = b"+ab\xc3\xa9".to_vec();
        truncate_line(&mut bytes, 4);
        assert_eq!(bytes, b"+ab");

        let mut bytes = "+a€b".as_bytes().to_vec();
        truncate_line(&mut bytes, 4);
        assert_eq!(bytes, b"+a");
    }

    #[test]
    fn test_truncate_keeps_legacy_bytes() {
        let mut bytes = b"-caf\xe9xxxx".to_vec();
        truncate_line(&mut bytes, 5);
        assert_eq!(bytes, b"-caf\xe9");

        let mut bytes = b"-na\xef\xe7xx".to_vec();
        truncate_line(&mut bytes, 4);
        assert_eq!(bytes, b"-na\xef");
    }

    #[test]
    fn test_truncate_on_character_boundary() {
        let mut bytes = "+é€x".as_bytes().to_vec();
        truncate_line(&mut bytes, 6);
        assert_eq!(bytes, "+é€".as_bytes());

        let mut bytes = b"short".to_vec();
        truncate_line(&mut bytes, 10);
        assert_eq!(bytes, b"short");
    }
}
