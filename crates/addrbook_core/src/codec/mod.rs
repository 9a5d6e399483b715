//! Import/export codecs between external contact formats and `ContactRecord`.
//!
//! # Responsibility
//! - Decode vCard and CSV text into canonical records or partial field maps.
//! - Encode canonical records back into vCard 3.0 and CSV text.
//!
//! # Invariants
//! - Codecs are pure functions of their input; no store access happens here.
//! - Best-effort salvage: malformed lines/rows are ignored, not reported.

pub mod csv_map;
pub mod csv_write;
pub mod vcard_decode;
pub mod vcard_encode;
pub mod vcard_escape;
