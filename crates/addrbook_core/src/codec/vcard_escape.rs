//! vCard text value escaping.
//!
//! # Invariants
//! - `unescape_text(escape_text(v))` is `v` for any value without `\r`.
//! - Structured values split only on unescaped `;`.

/// Escapes backslash, newline, comma and semicolon in a text value.
///
/// A `\r\n` pair or a lone `\r` is written as one escaped newline.
pub fn escape_text(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            ';' => escaped.push_str("\\;"),
            ',' => escaped.push_str("\\,"),
            '\n' => escaped.push_str("\\n"),
            '\r' => {
                chars.next_if_eq(&'\n');
                escaped.push_str("\\n");
            }
            _ => escaped.push(c),
        }
    }

    escaped
}

/// Reverses `escape_text`. Unknown escapes are kept verbatim.
pub fn unescape_text(value: &str) -> String {
    let mut text = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            text.push(c);
            continue;
        }
        match chars.peek() {
            Some('n' | 'N') => {
                chars.next();
                text.push('\n');
            }
            Some(&next @ ('\\' | ';' | ',')) => {
                chars.next();
                text.push(next);
            }
            _ => text.push(c),
        }
    }

    text
}

/// Splits a structured value such as `N` or `ADR` on unescaped `;`.
///
/// Components are returned still escaped.
pub fn split_structured(value: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut escaped = false;

    for (index, c) in value.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            ';' => {
                parts.push(&value[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }

    parts.push(&value[start..]);
    parts
}
