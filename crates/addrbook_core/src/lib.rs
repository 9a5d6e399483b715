//! Core domain logic for the address book.
//! This crate is the single source of truth for contact identity invariants.

pub mod codec;
pub mod config;
pub mod logging;
pub mod model;
pub mod service;
pub mod store;

pub use codec::csv_map::{read_csv, ColumnMapping, CsvImportError, CsvReader};
pub use codec::csv_write::{write_csv, ExportError};
pub use codec::vcard_decode::decode_vcard;
pub use codec::vcard_encode::encode_vcard;
pub use config::CoreConfig;
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::contact::{ContactField, ContactId, ContactRecord, PartialContact};
pub use service::import_service::{ImportReport, ImportService, DEFAULT_DIAGNOSTIC_LIMIT};
pub use store::{
    ContactRepository, ContactStore, IdentityResolution, StoreError, StoreResult, UpsertOutcome,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
