//! Change-application services.
//!
//! # Responsibility
//! - Apply a change request to a document in fixed phase order.
//! - Report one structured outcome per requested operation.
//!
//! # Invariants
//! - Soft failures (lookup misses, rejected requests) never abort a run.

pub mod change_processor;
pub mod change_report;
pub mod id_generator;
