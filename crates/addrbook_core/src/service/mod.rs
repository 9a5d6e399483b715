//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate codec output into repository calls.
//! - Keep presentation collaborators decoupled from storage details.

pub mod import_service;
