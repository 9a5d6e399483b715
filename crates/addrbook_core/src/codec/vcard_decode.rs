//! Lenient vCard 2.1/3.0 decoder.
//!
//! # Responsibility
//! - Unfold continuation lines and split input into `BEGIN:VCARD` blocks.
//! - Map the common contact properties onto `ContactRecord` fields.
//!
//! # Invariants
//! - Within one card the first non-empty value for a target field wins.
//! - Values are unescaped per component after structured splitting.
//! - Malformed lines and unknown properties are ignored, never fatal.
//! - Output order equals card order in the input.
//! - Decoding is a pure function of the input text.

use super::vcard_escape::{split_structured, unescape_text};
use crate::model::contact::{normalize_email, ContactField, ContactRecord};
use log::debug;
use std::collections::BTreeSet;

const BEGIN_CARD: &str = "BEGIN:VCARD";
const END_CARD: &str = "END:VCARD";
const UTF8_BOM: char = '\u{feff}';

/// Result of interpreting one content line inside a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineOutcome {
    /// The line filled at least this field.
    Recognized(ContactField),
    /// Malformed line, unknown property, empty value, or target already set.
    Ignored,
}

/// Normalizes line endings and joins folded continuation lines.
///
/// A line starting with one space or tab continues the previous logical line;
/// that single whitespace char is dropped and the rest appended verbatim.
/// Empty lines are kept as empty logical lines.
pub fn unfold_lines(raw: &str) -> Vec<String> {
    let raw = raw.strip_prefix(UTF8_BOM).unwrap_or(raw);
    let normalized = raw.replace("\r\n", "\n").replace('\r', "\n");
    let mut lines: Vec<String> = Vec::new();

    for line in normalized.split('\n') {
        if line.is_empty() {
            lines.push(String::new());
            continue;
        }
        if line.starts_with([' ', '\t']) {
            if let Some(prev) = lines.last_mut() {
                prev.push_str(&line[1..]);
                continue;
            }
        }
        lines.push(line.to_string());
    }

    lines
}

/// Decodes every card in `text` into canonical records.
///
/// A trailing card without `END:VCARD` is still returned when it collected
/// any field.
pub fn decode_vcard(text: &str) -> Vec<ContactRecord> {
    let mut contacts = Vec::new();
    let mut current: Option<ContactRecord> = None;
    let mut ignored_lines = 0_usize;

    for raw_line in unfold_lines(text) {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        if line.eq_ignore_ascii_case(BEGIN_CARD) {
            current = Some(ContactRecord::new());
            continue;
        }
        if line.eq_ignore_ascii_case(END_CARD) {
            if let Some(card) = current.take() {
                commit_card(&mut contacts, card);
            }
            continue;
        }

        let Some(card) = current.as_mut() else {
            continue;
        };
        if apply_line(card, line) == LineOutcome::Ignored {
            ignored_lines += 1;
        }
    }

    if let Some(card) = current.take() {
        commit_card(&mut contacts, card);
    }

    debug!(
        "event=vcard_decode module=codec status=ok cards={} ignored_lines={}",
        contacts.len(),
        ignored_lines
    );
    contacts
}

fn commit_card(contacts: &mut Vec<ContactRecord>, card: ContactRecord) {
    if card != ContactRecord::default() {
        contacts.push(card);
    }
}

fn apply_line(card: &mut ContactRecord, line: &str) -> LineOutcome {
    let Some((spec, value)) = line.split_once(':') else {
        return LineOutcome::Ignored;
    };

    let spec = spec.to_ascii_uppercase();
    let (name, params) = match spec.split_once(';') {
        Some((name, params)) => (name, params),
        None => (spec.as_str(), ""),
    };
    let name = strip_group(name);

    match name {
        "N" => apply_structured_name(card, value),
        "FN" => apply_formatted_name(card, value),
        "EMAIL" => fill(card, ContactField::Email, &normalize_email(&unescape_text(value))),
        "TEL" => apply_phone(card, params, value),
        "ADR" => apply_address(card, value),
        "URL" | "WEB" | "WEBSITE" => fill(card, ContactField::Website, &text_value(value)),
        "BDAY" | "BIRTHDAY" => fill(card, ContactField::BirthDate, &text_value(value)),
        _ => LineOutcome::Ignored,
    }
}

/// Drops an optional `group.` prefix such as `ITEM1.` in `ITEM1.EMAIL`.
fn strip_group(name: &str) -> &str {
    match name.split_once('.') {
        Some((group, rest))
            if !group.is_empty()
                && group.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') =>
        {
            rest
        }
        _ => name,
    }
}

/// Sets `field` when the value is non-empty and the target is still empty.
fn fill(card: &mut ContactRecord, field: ContactField, value: &str) -> LineOutcome {
    if value.is_empty() || card.has(field) {
        return LineOutcome::Ignored;
    }
    card.set(field, value);
    LineOutcome::Recognized(field)
}

fn text_value(raw: &str) -> String {
    unescape_text(raw.trim())
}

fn first_recognized(outcomes: &[LineOutcome]) -> LineOutcome {
    outcomes
        .iter()
        .copied()
        .find(|outcome| *outcome != LineOutcome::Ignored)
        .unwrap_or(LineOutcome::Ignored)
}

// N:Last;First;Additional;Prefix;Suffix
fn apply_structured_name(card: &mut ContactRecord, value: &str) -> LineOutcome {
    let mut parts = split_structured(value).into_iter().map(text_value);
    let last = parts.next().unwrap_or_default();
    let first = parts.next().unwrap_or_default();
    first_recognized(&[
        fill(card, ContactField::LastName, &last),
        fill(card, ContactField::FirstName, &first),
    ])
}

fn apply_formatted_name(card: &mut ContactRecord, value: &str) -> LineOutcome {
    if card.has(ContactField::LastName) {
        return LineOutcome::Ignored;
    }
    let value = unescape_text(value);
    let tokens: Vec<&str> = value.split_whitespace().collect();
    match tokens.split_last() {
        None => LineOutcome::Ignored,
        Some((last, [])) => fill(card, ContactField::LastName, last),
        Some((last, rest)) => first_recognized(&[
            fill(card, ContactField::LastName, last),
            fill(card, ContactField::FirstName, &rest.join(" ")),
        ]),
    }
}

/// Collects upper-cased type tokens from `TYPE=A,B` and legacy `;A;B` forms.
fn phone_types(params: &str) -> BTreeSet<String> {
    params
        .split(';')
        .map(|param| {
            let param = param.trim();
            param.strip_prefix("TYPE=").unwrap_or(param)
        })
        .flat_map(|param| param.split(','))
        .map(|token| token.trim().trim_matches('"').to_string())
        .filter(|token| !token.is_empty())
        .collect()
}

fn apply_phone(card: &mut ContactRecord, params: &str, value: &str) -> LineOutcome {
    let number = text_value(value);
    let number = number.as_str();
    if number.is_empty() {
        return LineOutcome::Ignored;
    }

    let types = phone_types(params);
    let has_type = |name: &str| types.contains(name);

    if has_type("CELL") || has_type("MOBILE") {
        return fill(card, ContactField::MobilePhone, number);
    }
    if has_type("HOME") || has_type("VOICE") {
        return fill(card, ContactField::HomePhone, number);
    }
    if !card.has(ContactField::HomePhone) {
        return fill(card, ContactField::HomePhone, number);
    }
    fill(card, ContactField::MobilePhone, number)
}

// ADR:PO box;extended;street;city;region;postal code;country
fn apply_address(card: &mut ContactRecord, value: &str) -> LineOutcome {
    let parts: Vec<String> = split_structured(value).into_iter().map(text_value).collect();
    let mut outcomes = Vec::with_capacity(3);

    if let Some(street) = parts.get(2) {
        outcomes.push(fill(card, ContactField::Street, street));
    }
    if parts.len() >= 6 {
        outcomes.push(fill(card, ContactField::City, &parts[3]));
        outcomes.push(fill(card, ContactField::PostalCode, &parts[5]));
    }

    first_recognized(&outcomes)
}
