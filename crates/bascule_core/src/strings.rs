//! String-literal escape encoding.
//!
//! String constants travel through the compiler in their *IR-escaped* form: every character that the IR
//! text format cannot carry verbatim is replaced by a backslash followed by exactly three decimal digits
//! (`\010` for a newline). The lexer produces this form directly, so constant folding (concatenation) and
//! IR rendering never need to re-escape.
//!
//! ## Notes
//! - Characters with code `0..=32`, `#` (35) and `\` (92) must be escaped; everything else is kept verbatim.
//! - Concatenating two escaped strings yields the escaped form of the concatenation, because every escape is
//!   self-contained.

/// Whether a character must be written as a numeric escape.
///
/// ## Examples
/// ```rust
/// use bascule_core::strings::needs_escape;
///
/// assert!(needs_escape(' '));
/// assert!(needs_escape('#'));
/// assert!(needs_escape('\\'));
/// assert!(!needs_escape('a'));
/// ```
pub fn needs_escape(c: char) -> bool {
    (c as u32) <= 32 || c == '#' || c == '\\'
}

/// Append the three-digit escape for `code` (`\009` for 9).
pub fn push_code_escape(out: &mut String, code: u8) {
    out.push('\\');
    out.push_str(&format!("{code:03}"));
}

/// Append `c` to `out`, escaping it when the IR text format requires.
///
/// ## Examples
/// ```rust
/// use bascule_core::strings::push_escaped;
///
/// let mut out = String::new();
/// for c in "a b#".chars() {
///     push_escaped(&mut out, c);
/// }
/// assert_eq!(out, "a\\032b\\035");
/// ```
pub fn push_escaped(out: &mut String, c: char) {
    if needs_escape(c) {
        // `needs_escape` only admits codes up to 92.
        push_code_escape(out, c as u8);
    } else {
        out.push(c);
    }
}

/// Escape a whole plain string.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        push_escaped(&mut out, c);
    }
    out
}

/// Number of characters the escaped text stands for (each `\ddd` counts once).
///
/// ## Examples
/// ```rust
/// use bascule_core::strings::escaped_len;
///
/// assert_eq!(escaped_len("a\\009b"), 3);
/// ```
pub fn escaped_len(escaped: &str) -> usize {
    let mut len = 0;
    let mut chars = escaped.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            chars.nth(2);
        }
        len += 1;
    }
    len
}

/// Decode IR-escaped text back into raw bytes.
///
/// ## Examples
/// ```rust
/// use bascule_core::strings::unescape;
///
/// assert_eq!(unescape("a\\065"), b"aA".to_vec());
/// ```
pub fn unescape(escaped: &str) -> Vec<u8> {
    let bytes = escaped.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let digits = bytes.get(i + 1..i + 4);
        match digits {
            Some(d) if bytes[i] == b'\\' && d.iter().all(u8::is_ascii_digit) => {
                let code = d.iter().fold(0u32, |acc, c| acc * 10 + u32::from(c - b'0'));
                out.push(u8::try_from(code).unwrap_or(u8::MAX));
                i += 4;
            }
            _ => {
                out.push(bytes[i]);
                i += 1;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_control_characters() {
        assert_eq!(escape("a\tb\n"), "a\\009b\\010");
        assert_eq!(escape("\\"), "\\092");
        assert_eq!(escape("x y"), "x\\032y");
    }

    #[test]
    fn test_escape_keeps_printable_and_non_ascii() {
        assert_eq!(escape("Hello!\"é"), "Hello!\"é");
    }

    #[test]
    fn test_unescape_inverts_escape() {
        assert_eq!(unescape(&escape("a b\tc#")), b"a b\tc#".to_vec());
        assert_eq!(unescape("\\034x"), b"\"x".to_vec());
    }

    #[test]
    fn test_escaped_len_counts_escapes_once() {
        assert_eq!(escaped_len(""), 0);
        assert_eq!(escaped_len("abc"), 3);
        assert_eq!(escaped_len("\\032\\035x"), 3);
    }
}
