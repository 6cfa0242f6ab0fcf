//! Collection identifier generation.
//!
//! # Responsibility
//! - Produce string identifiers for newly created collections.
//!
//! # Invariants
//! - Generators are not required to check uniqueness themselves; the change
//!   processor rejects candidates that collide with stored collection ids.

use crate::model::document::CollectionId;
use uuid::Uuid;

/// Source of candidate collection identifiers.
pub trait IdGenerator {
    fn next_id(&mut self) -> CollectionId;
}

/// Random (v4) UUID rendered in lowercase hyphenated form.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_id(&mut self) -> CollectionId {
        Uuid::new_v4().to_string()
    }
}

/// Deterministic generator yielding `<prefix>1`, `<prefix>2`, ...
///
/// Useful where output must be reproducible, such as fixtures and tests.
#[derive(Debug, Clone)]
pub struct SequentialIdGenerator {
    prefix: String,
    next: u64,
}

impl SequentialIdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self::starting_at(prefix, 1)
    }

    pub fn starting_at(prefix: impl Into<String>, first: u64) -> Self {
        Self {
            prefix: prefix.into(),
            next: first,
        }
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&mut self) -> CollectionId {
        let id = format!("{}{}", self.prefix, self.next);
        self.next += 1;
        id
    }
}
