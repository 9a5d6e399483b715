//! CSV header mapping and row projection for contact import.
//!
//! # Responsibility
//! - Guess the delimiter of an unknown export (`;` or `,`).
//! - Map arbitrary header vocabularies onto canonical contact fields.
//! - Project data rows into `PartialContact` values lazily.
//!
//! # Invariants
//! - A header row is mandatory; its absence fails the whole import.
//! - Fields without a matching header stay absent in projected rows.
//! - Malformed rows and unmapped columns are ignored silently.

use crate::model::contact::{ContactField, PartialContact};
use log::debug;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Number of leading bytes inspected by delimiter detection.
pub const DELIMITER_SAMPLE_BYTES: usize = 2048;

const UTF8_BOM: char = '\u{feff}';

/// Accepted header aliases per canonical field, in priority order.
///
/// Headers are compared after trimming and lower-casing.
pub const HEADER_ALIASES: &[(ContactField, &[&str])] = &[
    (
        ContactField::FirstName,
        &["vorname", "firstname", "first_name", "givenname", "given_name"],
    ),
    (
        ContactField::LastName,
        &[
            "name",
            "nachname",
            "lastname",
            "last_name",
            "surname",
            "familyname",
            "family_name",
        ],
    ),
    (
        ContactField::Street,
        &["strasse", "straße", "street", "address", "addr"],
    ),
    (
        ContactField::PostalCode,
        &["plz", "zip", "postal", "postalcode", "postal_code"],
    ),
    (ContactField::City, &["ort", "city", "town"]),
    (
        ContactField::MobilePhone,
        &["mobile", "handy", "cell", "cellphone", "cell_phone"],
    ),
    (
        ContactField::HomePhone,
        &["festnetz", "phone", "tel", "telephone", "homephone", "home_phone"],
    ),
    (ContactField::Email, &["email", "e-mail", "mail"]),
    (
        ContactField::BirthDate,
        &["geburtsdatum", "birthday", "bday", "birthdate", "birth_date"],
    ),
    (ContactField::Website, &["webseite", "website", "url", "web"]),
];

/// Fatal CSV import error. Raised before any row is produced.
#[derive(Debug)]
pub enum CsvImportError {
    /// Content has no header row.
    MissingHeader,
    /// Underlying CSV reader failure while reading the header.
    Csv(csv::Error),
}

impl Display for CsvImportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingHeader => write!(f, "no header row found"),
            Self::Csv(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CsvImportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::MissingHeader => None,
            Self::Csv(err) => Some(err),
        }
    }
}

impl From<csv::Error> for CsvImportError {
    fn from(value: csv::Error) -> Self {
        Self::Csv(value)
    }
}

/// Picks `,` only when commas strictly outnumber semicolons in the sample.
///
/// Best-effort heuristic: quoted values containing either character can skew
/// the count.
pub fn detect_delimiter(content: &str) -> u8 {
    let sample = sample_prefix(content, DELIMITER_SAMPLE_BYTES);
    let semicolons = sample.matches(';').count();
    let commas = sample.matches(',').count();
    if commas > semicolons {
        b','
    } else {
        b';'
    }
}

fn sample_prefix(content: &str, max_bytes: usize) -> &str {
    if content.len() <= max_bytes {
        return content;
    }
    let mut end = max_bytes;
    while !content.is_char_boundary(end) {
        end -= 1;
    }
    &content[..end]
}

/// Normalizes a header name for alias lookup.
pub fn normalize_header(header: &str) -> String {
    header.trim().to_lowercase()
}

/// Canonical field to source column mapping, built once per file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMapping {
    columns: BTreeMap<ContactField, (usize, String)>,
}

impl ColumnMapping {
    /// Builds the mapping from raw header names.
    ///
    /// For each field the first alias (in priority order) present among the
    /// headers wins. Duplicate headers resolve to their first column.
    pub fn from_headers<'a>(headers: impl IntoIterator<Item = &'a str>) -> Self {
        let mut by_name: BTreeMap<String, (usize, &'a str)> = BTreeMap::new();
        for (index, header) in headers.into_iter().enumerate() {
            by_name
                .entry(normalize_header(header))
                .or_insert((index, header));
        }

        let mut columns = BTreeMap::new();
        for (field, aliases) in HEADER_ALIASES {
            let hit = aliases.iter().find_map(|alias| by_name.get(*alias));
            if let Some((index, header)) = hit {
                columns.insert(*field, (*index, (*header).to_string()));
            }
        }

        Self { columns }
    }

    /// Source header name mapped to `field`, if any.
    pub fn source_header(&self, field: ContactField) -> Option<&str> {
        self.columns.get(&field).map(|(_, header)| header.as_str())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Projects one data row; short rows yield empty values for missing cells.
    pub fn project(&self, row: &csv::StringRecord) -> PartialContact {
        let mut partial = PartialContact::new();
        for (field, (index, _)) in &self.columns {
            let value = row.get(*index).unwrap_or_default().trim();
            partial.insert(*field, value);
        }
        partial
    }
}

/// Header-aware reader over one CSV document.
///
/// Holds the source text, so [`CsvReader::rows`] can be restarted.
#[derive(Debug, Clone)]
pub struct CsvReader<'a> {
    content: &'a str,
    delimiter: u8,
    mapping: ColumnMapping,
}

impl<'a> CsvReader<'a> {
    /// Detects the delimiter and reads the mandatory header row.
    ///
    /// # Errors
    /// - `MissingHeader` when the content has no (non-blank) header row.
    /// - `Csv` when the header row cannot be read.
    pub fn new(content: &'a str) -> Result<Self, CsvImportError> {
        let content = content.strip_prefix(UTF8_BOM).unwrap_or(content);
        let delimiter = detect_delimiter(content);

        let mut reader = build_reader(content, delimiter);
        let headers = reader.headers()?;
        if headers.iter().all(|header| header.trim().is_empty()) {
            return Err(CsvImportError::MissingHeader);
        }
        let mapping = ColumnMapping::from_headers(headers.iter());

        debug!(
            "event=csv_header module=codec status=ok delimiter={} columns={} mapped_fields={}",
            char::from(delimiter),
            headers.len(),
            mapping.len()
        );

        Ok(Self {
            content,
            delimiter,
            mapping,
        })
    }

    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    pub fn mapping(&self) -> &ColumnMapping {
        &self.mapping
    }

    /// Lazily yields one partial contact per data row.
    ///
    /// Rows that fail to parse are skipped. Nothing is yielded when no header
    /// matched a canonical field.
    pub fn rows(&self) -> CsvRows<'_> {
        CsvRows {
            records: build_reader(self.content, self.delimiter).into_records(),
            mapping: &self.mapping,
        }
    }
}

fn build_reader(content: &str, delimiter: u8) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(content.as_bytes())
}

/// Iterator returned by [`CsvReader::rows`].
pub struct CsvRows<'r> {
    records: csv::StringRecordsIntoIter<&'r [u8]>,
    mapping: &'r ColumnMapping,
}

impl Iterator for CsvRows<'_> {
    type Item = PartialContact;

    fn next(&mut self) -> Option<Self::Item> {
        if self.mapping.is_empty() {
            return None;
        }
        loop {
            match self.records.next()? {
                Ok(row) => {
                    let partial = self.mapping.project(&row);
                    if !partial.is_empty() {
                        return Some(partial);
                    }
                }
                Err(err) => {
                    debug!("event=csv_row module=codec status=skipped error={err}");
                }
            }
        }
    }
}

/// Reads a whole CSV document into partial contacts.
///
/// # Errors
/// Returns `CsvImportError` when the header row is missing or unreadable.
pub fn read_csv(content: &str) -> Result<Vec<PartialContact>, CsvImportError> {
    let reader = CsvReader::new(content)?;
    Ok(reader.rows().collect())
}
