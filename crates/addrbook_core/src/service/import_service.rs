//! Import use-case service.
//!
//! # Responsibility
//! - Drive decoded records through repository upserts.
//! - Account added/updated/skipped counts plus labeled diagnostics.
//!
//! # Invariants
//! - Update-vs-add classification uses the pre-upsert email lookup.
//! - A failing record never aborts the remaining batch.
//! - This service never caps diagnostics; consumers decide what to show.

use crate::codec::csv_map::{CsvImportError, CsvReader};
use crate::codec::vcard_decode::decode_vcard;
use crate::model::contact::{normalize_email, ContactRecord};
use crate::store::ContactRepository;
use log::{info, warn};
use std::time::Instant;

/// Number of diagnostics a typical consumer shows.
pub const DEFAULT_DIAGNOSTIC_LIMIT: usize = 10;

/// Outcome counts of one import batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub added: usize,
    pub updated: usize,
    pub skipped: usize,
    /// `"<label>: <error>"` per skipped record, in input order.
    pub errors: Vec<String>,
}

impl ImportReport {
    /// Total number of records seen.
    pub fn total(&self) -> usize {
        self.added + self.updated + self.skipped
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Renders a human-readable summary with at most `max_errors` diagnostics.
    pub fn summary(&self, source_label: &str, max_errors: usize) -> String {
        let mut out = format!(
            "{source_label} import finished.\nAdded: {}\nUpdated: {}\nSkipped: {}",
            self.added, self.updated, self.skipped
        );
        if self.has_errors() {
            out.push_str(&format!("\n\nErrors (first {max_errors}):"));
            for error in self.errors.iter().take(max_errors) {
                out.push('\n');
                out.push_str(error);
            }
        }
        out
    }
}

/// Use-case service importing decoded contacts into a repository.
pub struct ImportService<R: ContactRepository> {
    repo: R,
}

impl<R: ContactRepository> ImportService<R> {
    /// Creates a service over the provided repository.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Returns the wrapped repository.
    pub fn into_inner(self) -> R {
        self.repo
    }

    /// Upserts every record and tallies the outcome.
    ///
    /// # Contract
    /// - `updated` when the normalized email already existed before upsert,
    ///   `added` otherwise (including id-only matches without email).
    /// - Upsert errors increment `skipped` and append a labeled diagnostic.
    pub fn import_records<I>(&mut self, records: I) -> ImportReport
    where
        I: IntoIterator,
        I::Item: Into<ContactRecord>,
    {
        let started_at = Instant::now();
        let mut report = ImportReport::default();

        for item in records {
            let record: ContactRecord = item.into();
            let email = normalize_email(&record.email);
            let existed = !email.is_empty() && self.repo.find_by_email(&email).is_some();
            let label = record.label();

            match self.repo.upsert(record) {
                Ok(_) if existed => report.updated += 1,
                Ok(_) => report.added += 1,
                Err(err) => {
                    report.skipped += 1;
                    report.errors.push(format!("{label}: {err}"));
                }
            }
        }

        if report.has_errors() {
            warn!(
                "event=import module=service status=partial added={} updated={} skipped={} duration_ms={}",
                report.added,
                report.updated,
                report.skipped,
                started_at.elapsed().as_millis()
            );
        } else {
            info!(
                "event=import module=service status=ok added={} updated={} skipped={} duration_ms={}",
                report.added,
                report.updated,
                report.skipped,
                started_at.elapsed().as_millis()
            );
        }
        report
    }

    /// Decodes vCard text and imports every card.
    pub fn import_vcard(&mut self, text: &str) -> ImportReport {
        self.import_records(decode_vcard(text))
    }

    /// Maps CSV text and imports every row.
    ///
    /// # Errors
    /// Returns `CsvImportError` before touching the repository when the
    /// header row is missing.
    pub fn import_csv(&mut self, text: &str) -> Result<ImportReport, CsvImportError> {
        let reader = CsvReader::new(text)?;
        Ok(self.import_records(reader.rows()))
    }
}
