//! Text clean-up applied to every string sent to either platform.

use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

pub(crate) static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("WHITESPACE_RUN is a valid regex pattern"));

/// Zero-width and bidi control characters some APIs reject.
fn is_invisible(c: char) -> bool {
    matches!(
        c,
        '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{200E}' | '\u{200F}' | '\u{FEFF}'
    ) || ('\u{202A}'..='\u{202E}').contains(&c)
}

/// NFKC-normalize, drop invisible and control characters (CR, LF and TAB are
/// kept), turn non-breaking spaces into spaces and trim.
///
/// With `collapse_whitespace` every whitespace run becomes a single space.
#[must_use]
pub fn sanitize_text(input: &str, collapse_whitespace: bool) -> String {
    let cleaned: String = input
        .nfkc()
        .filter(|c| !is_invisible(*c))
        .map(|c| if c == '\u{00A0}' { ' ' } else { c })
        .filter(|c| !c.is_control() || matches!(c, '\r' | '\n' | '\t'))
        .collect();
    let trimmed = cleaned.trim();
    if collapse_whitespace {
        WHITESPACE_RUN.replace_all(trimmed, " ").into_owned()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_invisible_characters() {
        assert_eq!(sanitize_text("\u{FEFF}ab\u{200B}c\u{202E}", false), "abc");
    }

    #[test]
    fn test_nbsp_and_trim() {
        assert_eq!(sanitize_text("\u{00A0} hello\u{00A0}world  ", false), "hello world");
    }

    #[test]
    fn test_control_characters() {
        assert_eq!(sanitize_text("a\u{0007}b\tc\nd", false), "ab\tc\nd");
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(sanitize_text("  a \t\n b   c ", true), "a b c");
        assert_eq!(sanitize_text("  a \t\n b   c ", false), "a \t\n b   c");
    }

    #[test]
    fn test_nfkc() {
        assert_eq!(sanitize_text("ｆｕｌｌ", false), "full");
        assert_eq!(sanitize_text("\u{FB01}le", false), "file");
    }
}
