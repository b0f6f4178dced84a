//! Best-effort cleanup of pasted source text before it is handed to external tools.
//!
//! Removes invisible characters that editors and chat clients like to smuggle
//! into copied code, and collapses whitespace that follows a backslash.
//! The transform is lossy: it can change the meaning of code that relied on
//! the removed characters.

use regex::Regex;
use std::sync::LazyLock;

// Spaces and tabs only. A backslash before a line break is a line
// continuation and stays as written.
static BACKSLASH_WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\[ \t]+").expect("static pattern"));

/// Return a cleaned copy of `code`; the input is left untouched.
pub fn sanitize(code: &str) -> String {
    let printable: String = code.chars().filter(|&c| is_printable(c)).collect();
    BACKSLASH_WHITESPACE
        .replace_all(&printable, "\\")
        .into_owned()
}

/// Printable in the sense of Python's `str.isprintable`, except that line
/// feeds and tabs are kept so the code keeps its shape.
pub fn is_printable(c: char) -> bool {
    match c {
        '\n' | '\t' | ' ' => true,
        _ if c.is_control() => false,
        _ if c.is_whitespace() => false,
        _ => !is_format_or_private(c),
    }
}

fn is_format_or_private(c: char) -> bool {
    matches!(
        c,
        '\u{00AD}'
            | '\u{061C}'
            | '\u{180E}'
            | '\u{200B}'..='\u{200F}'
            | '\u{202A}'..='\u{202E}'
            | '\u{2060}'..='\u{2064}'
            | '\u{2066}'..='\u{206F}'
            | '\u{FEFF}'
            | '\u{FFF9}'..='\u{FFFB}'
            | '\u{E000}'..='\u{F8FF}'
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_code_is_unchanged() {
        let code = "def f(x):\n\treturn x + 1\n";
        assert_eq!(sanitize(code), code);
    }

    #[test]
    fn test_removes_zero_width_and_bom() {
        let code = "\u{FEFF}x = 1\u{200B}\n";
        assert_eq!(sanitize(code), "x = 1\n");
    }

    #[test]
    fn test_removes_carriage_returns_and_nbsp() {
        assert_eq!(sanitize("a = 1\r\nb\u{00A0}= 2\r\n"), "a = 1\nb= 2\n");
    }

    #[test]
    fn test_collapses_whitespace_after_backslash() {
        assert_eq!(sanitize("x = 1 + \\   \n    2\n"), "x = 1 + \\\n    2\n");
        assert_eq!(sanitize("a\\ \t b"), "a\\b");
    }

    #[test]
    fn test_line_continuation_is_kept() {
        let source = "total = 1 + \\\n    2\n";
        assert_eq!(sanitize(source), source);
        assert_eq!(sanitize("x = \\\r\n1\n"), "x = \\\n1\n");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(sanitize(""), "");
    }

    #[test]
    fn test_idempotent_on_messy_input() {
        let once = sanitize("\\ \\ \u{0007}x\u{2028}\\\t\n");
        assert_eq!(sanitize(&once), once);
    }

    #[test]
    fn test_keeps_non_ascii_letters() {
        assert_eq!(sanitize("name = 'Zoë ☃'\n"), "name = 'Zoë ☃'\n");
    }
}
