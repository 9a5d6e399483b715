//! Durable contact storage.
//!
//! # Responsibility
//! - Hold the canonical contact collection behind an owned store instance.
//! - Resolve record identity (id first, then email) on every upsert.
//! - Persist the whole collection atomically after each mutation.
//!
//! # Invariants
//! - Every stored contact has a non-empty id, unique within the store.
//! - A failed write leaves both the previous durable file and the in-memory
//!   state untouched.
//! - Load failures degrade to an empty store instead of propagating.

pub mod contact_store;

pub use contact_store::{
    ContactRepository, ContactStore, IdentityResolution, StoreError, StoreResult, UpsertOutcome,
};
