use std::cmp::Ordering;

/// Whitespace as the C locale classifies it: space, tab, newline, vertical tab,
/// form feed and carriage return.
pub fn is_blank(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\x0B' | '\x0C' | '\r')
}

pub fn trim(input: &str) -> &str {
    input.trim_matches(is_blank)
}

pub fn fold(byte: u8) -> u8 {
    byte.to_ascii_lowercase()
}

/// Lexicographic comparison over ASCII-folded bytes. Non-ASCII bytes compare as-is.
pub fn compare_ignore_case(a: &str, b: &str) -> Ordering {
    a.bytes().map(fold).cmp(b.bytes().map(fold))
}

/// Case-insensitive substring test. An empty needle matches any haystack.
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    let needle = needle.as_bytes();
    if needle.is_empty() {
        return true;
    }

    haystack
        .as_bytes()
        .windows(needle.len())
        .any(|window| window.eq_ignore_ascii_case(needle))
}

pub fn is_alphanumeric_only(input: &str) -> bool {
    !input.is_empty() && input.bytes().all(|b| b.is_ascii_alphanumeric())
}
