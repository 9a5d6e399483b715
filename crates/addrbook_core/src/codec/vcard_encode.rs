//! vCard 3.0 encoder for contact export.
//!
//! # Invariants
//! - One `BEGIN:VCARD`/`END:VCARD` block per record, in input order.
//! - Property order is fixed; properties with empty values are omitted.

use super::vcard_escape::escape_text;
use crate::model::contact::ContactRecord;
use once_cell::sync::Lazy;
use regex::Regex;

static URL_SCHEME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:[a-z][a-z0-9+.\-]*://|mailto:|tel:)").expect("valid url scheme regex")
});

const DEFAULT_URL_SCHEME: &str = "https://";

/// Serializes records into vCard 3.0 text with `\n` line endings.
///
/// Text values are escaped so `;`, `,`, `\` and line breaks survive decoding.
pub fn encode_vcard(contacts: &[ContactRecord]) -> String {
    let mut out = String::new();
    for contact in contacts {
        push_card(&mut out, contact);
    }
    out
}

/// Prepends `https://` when the website has no recognizable scheme.
pub fn normalize_website(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() || URL_SCHEME_RE.is_match(trimmed) {
        return trimmed.to_string();
    }
    format!("{DEFAULT_URL_SCHEME}{trimmed}")
}

fn push_line(out: &mut String, line: &str) {
    out.push_str(line);
    out.push('\n');
}

fn push_property(out: &mut String, name: &str, value: &str) {
    if !value.is_empty() {
        push_line(out, &format!("{name}:{}", escape_text(value)));
    }
}

fn push_card(out: &mut String, c: &ContactRecord) {
    push_line(out, "BEGIN:VCARD");
    push_line(out, "VERSION:3.0");
    push_line(
        out,
        &format!(
            "N:{};{};;;",
            escape_text(&c.last_name),
            escape_text(&c.first_name)
        ),
    );
    push_line(out, &format!("FN:{}", escape_text(&c.full_name())));
    push_property(out, "EMAIL", &c.email);
    push_property(out, "TEL;TYPE=CELL", &c.mobile_phone);
    push_property(out, "TEL;TYPE=HOME", &c.home_phone);
    if !c.street.is_empty() || !c.city.is_empty() || !c.postal_code.is_empty() {
        push_line(
            out,
            &format!(
                "ADR;TYPE=HOME:;;{};{};;{};;",
                escape_text(&c.street),
                escape_text(&c.city),
                escape_text(&c.postal_code)
            ),
        );
    }
    push_property(out, "URL", &normalize_website(&c.website));
    push_property(out, "BDAY", &c.birth_date);
    push_line(out, "END:VCARD");
}
