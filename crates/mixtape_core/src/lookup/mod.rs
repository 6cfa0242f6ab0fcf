//! Reference resolution over an in-memory document.
//!
//! # Responsibility
//! - Resolve collection, item and user references by identifier.
//! - Keep lookup misses informational; they are never errors.
//!
//! # Invariants
//! - Lookups never mutate the document.
//! - An absent top-level mapping behaves like an empty one.

pub mod document_lookup;
