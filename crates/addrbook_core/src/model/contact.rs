//! Contact domain model.
//!
//! # Responsibility
//! - Define the canonical record every import/export format maps into.
//! - Provide the named full-replace merge used by store upserts.
//!
//! # Invariants
//! - `id` is opaque, stable and never reused for another contact.
//! - Absent values are empty strings; empty never means "clear this field".
//! - Email comparisons are case-insensitive over trimmed values.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Opaque stable identifier of one contact.
///
/// Kept as a string alias because persisted stores may carry ids produced by
/// older tools in arbitrary formats.
pub type ContactId = String;

/// Placeholder used when a contact has neither email nor name.
pub const UNKNOWN_CONTACT_LABEL: &str = "(unknown)";

/// Canonical data fields of a contact, in canonical export order.
///
/// `id` and `last_used` are bookkeeping and intentionally not listed here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ContactField {
    FirstName,
    LastName,
    Street,
    PostalCode,
    City,
    MobilePhone,
    HomePhone,
    Email,
    BirthDate,
    Website,
}

impl ContactField {
    /// All data fields in canonical order.
    pub const ALL: [ContactField; 10] = [
        ContactField::FirstName,
        ContactField::LastName,
        ContactField::Street,
        ContactField::PostalCode,
        ContactField::City,
        ContactField::MobilePhone,
        ContactField::HomePhone,
        ContactField::Email,
        ContactField::BirthDate,
        ContactField::Website,
    ];

    /// Canonical snake_case name, as written to the store.
    pub fn name(self) -> &'static str {
        match self {
            Self::FirstName => "first_name",
            Self::LastName => "last_name",
            Self::Street => "street",
            Self::PostalCode => "postal_code",
            Self::City => "city",
            Self::MobilePhone => "mobile_phone",
            Self::HomePhone => "home_phone",
            Self::Email => "email",
            Self::BirthDate => "birth_date",
            Self::Website => "website",
        }
    }

    /// Legacy key used by older stores and by CSV export headers.
    pub fn legacy_key(self) -> &'static str {
        match self {
            Self::FirstName => "vorname",
            Self::LastName => "name",
            Self::Street => "strasse",
            Self::PostalCode => "plz",
            Self::City => "ort",
            Self::MobilePhone => "mobile",
            Self::HomePhone => "festnetz",
            Self::Email => "email",
            Self::BirthDate => "geburtsdatum",
            Self::Website => "webseite",
        }
    }
}

/// Canonical contact record.
///
/// Serialized with canonical field names; legacy keys are accepted on read so
/// address books written by the previous tool keep loading. Field values are
/// read leniently: numbers and booleans keep their text form, `null` and
/// nested values become empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactRecord {
    /// Stable store identity. Empty until the store assigns one.
    #[serde(alias = "_id", deserialize_with = "lenient_text")]
    pub id: ContactId,
    #[serde(alias = "vorname", deserialize_with = "lenient_text")]
    pub first_name: String,
    #[serde(alias = "name", deserialize_with = "lenient_text")]
    pub last_name: String,
    #[serde(alias = "strasse", deserialize_with = "lenient_text")]
    pub street: String,
    #[serde(alias = "plz", deserialize_with = "lenient_text")]
    pub postal_code: String,
    #[serde(alias = "ort", deserialize_with = "lenient_text")]
    pub city: String,
    #[serde(alias = "mobile", deserialize_with = "lenient_text")]
    pub mobile_phone: String,
    #[serde(alias = "festnetz", deserialize_with = "lenient_text")]
    pub home_phone: String,
    #[serde(deserialize_with = "lenient_text")]
    pub email: String,
    #[serde(alias = "geburtsdatum", deserialize_with = "lenient_text")]
    pub birth_date: String,
    #[serde(alias = "webseite", deserialize_with = "lenient_text")]
    pub website: String,
    /// Advisory timestamp for display ordering only.
    #[serde(deserialize_with = "lenient_text")]
    pub last_used: String,
}

fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => text,
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => String::new(),
    })
}

impl ContactRecord {
    /// Creates an empty record without identity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty record carrying a caller-provided id.
    pub fn with_id(id: impl Into<ContactId>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Returns the value of one data field.
    pub fn get(&self, field: ContactField) -> &str {
        match field {
            ContactField::FirstName => &self.first_name,
            ContactField::LastName => &self.last_name,
            ContactField::Street => &self.street,
            ContactField::PostalCode => &self.postal_code,
            ContactField::City => &self.city,
            ContactField::MobilePhone => &self.mobile_phone,
            ContactField::HomePhone => &self.home_phone,
            ContactField::Email => &self.email,
            ContactField::BirthDate => &self.birth_date,
            ContactField::Website => &self.website,
        }
    }

    /// Overwrites one data field.
    pub fn set(&mut self, field: ContactField, value: impl Into<String>) {
        let slot = match field {
            ContactField::FirstName => &mut self.first_name,
            ContactField::LastName => &mut self.last_name,
            ContactField::Street => &mut self.street,
            ContactField::PostalCode => &mut self.postal_code,
            ContactField::City => &mut self.city,
            ContactField::MobilePhone => &mut self.mobile_phone,
            ContactField::HomePhone => &mut self.home_phone,
            ContactField::Email => &mut self.email,
            ContactField::BirthDate => &mut self.birth_date,
            ContactField::Website => &mut self.website,
        };
        *slot = value.into();
    }

    /// Returns whether a data field holds a non-empty value.
    pub fn has(&self, field: ContactField) -> bool {
        !self.get(field).is_empty()
    }

    /// Full-replace merge: copies every field except `id` from `incoming`.
    ///
    /// # Contract
    /// - Empty incoming values overwrite stored values.
    /// - `self.id` is never modified.
    pub fn replace_fields_from(&mut self, incoming: &ContactRecord) {
        let id = std::mem::take(&mut self.id);
        *self = ContactRecord {
            id,
            ..incoming.clone()
        };
    }

    /// Returns `first last`, trimmed.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }

    /// Label used in import diagnostics: email, else name, else placeholder.
    pub fn label(&self) -> String {
        let email = self.email.trim();
        if !email.is_empty() {
            return email.to_string();
        }
        let name = self.full_name();
        if !name.is_empty() {
            return name;
        }
        UNKNOWN_CONTACT_LABEL.to_string()
    }
}

/// Generates a fresh opaque contact id.
pub fn new_contact_id() -> ContactId {
    Uuid::new_v4().simple().to_string()
}

/// Normalizes an email for storage and comparison.
pub fn normalize_email(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Partial field map produced by column-based importers.
///
/// Fields that had no source column are absent rather than empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialContact {
    pub id: Option<ContactId>,
    pub fields: BTreeMap<ContactField, String>,
}

impl PartialContact {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: ContactField, value: impl Into<String>) {
        self.fields.insert(field, value.into());
    }

    pub fn get(&self, field: ContactField) -> Option<&str> {
        self.fields.get(&field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.fields.is_empty()
    }

    /// Collapses the partial map into a full record with empty defaults.
    pub fn into_record(self) -> ContactRecord {
        let mut record = ContactRecord::with_id(self.id.unwrap_or_default());
        for (field, value) in self.fields {
            record.set(field, value);
        }
        record
    }
}

impl From<PartialContact> for ContactRecord {
    fn from(value: PartialContact) -> Self {
        value.into_record()
    }
}
