//! Canonical domain model for imported and stored contacts.
//!
//! # Responsibility
//! - Define the one record shape all import/export formats map into.
//! - Keep identity and merge helpers next to the data they govern.
//!
//! # Invariants
//! - Every stored contact is identified by a stable `ContactId`.
//! - Deletion is a hard delete by id; imports never delete.

pub mod contact;
