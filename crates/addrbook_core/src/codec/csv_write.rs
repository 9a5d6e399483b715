//! Semicolon-delimited CSV export.
//!
//! # Invariants
//! - Delimiter is always `;`.
//! - Header row uses legacy keys in canonical field order.

use crate::model::contact::{ContactField, ContactRecord};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::string::FromUtf8Error;

/// Fixed export delimiter.
pub const EXPORT_DELIMITER: u8 = b';';

/// CSV export failure.
#[derive(Debug)]
pub enum ExportError {
    Csv(csv::Error),
    Io(std::io::Error),
    Utf8(FromUtf8Error),
}

impl Display for ExportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Csv(err) => write!(f, "{err}"),
            Self::Io(err) => write!(f, "{err}"),
            Self::Utf8(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ExportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Csv(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::Utf8(err) => Some(err),
        }
    }
}

impl From<csv::Error> for ExportError {
    fn from(value: csv::Error) -> Self {
        Self::Csv(value)
    }
}

/// Header names written by [`write_csv`].
pub fn export_headers() -> Vec<&'static str> {
    ContactField::ALL
        .iter()
        .map(|field| field.legacy_key())
        .collect()
}

/// Serializes records into CSV text, one row per record.
///
/// # Errors
/// Returns `ExportError` when the CSV writer fails.
pub fn write_csv(contacts: &[ContactRecord]) -> Result<String, ExportError> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(EXPORT_DELIMITER)
        .from_writer(Vec::new());

    writer.write_record(export_headers())?;
    for contact in contacts {
        writer.write_record(ContactField::ALL.iter().map(|field| contact.get(*field)))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|err| ExportError::Io(err.into_error()))?;
    String::from_utf8(bytes).map_err(ExportError::Utf8)
}
