//! Core change-application engine for mixtape documents.
//! This crate is the single source of truth for change rules and invariants.

pub mod logging;
pub mod lookup;
pub mod model;
pub mod service;
pub mod store;

pub use logging::{default_log_level, init_logging, logging_status, LogDestination};
pub use lookup::document_lookup::DocumentLookup;
pub use model::change::{Additions, ChangeRequest, CollectionUpdate, Deletions, NewCollection};
pub use model::document::{
    Collection, CollectionEntry, CollectionId, Document, Item, ItemId, User, UserId,
};
pub use model::{ensure_object, ModelError, ModelResult, CHANGES_PARAMETER, MIXTAPE_PARAMETER};
pub use service::change_processor::{ChangeProcessor, MAX_ID_ATTEMPTS};
pub use service::change_report::{
    ChangeOutcome, ChangePhase, ChangeRecord, ChangeReport, RejectReason,
};
pub use service::id_generator::{IdGenerator, SequentialIdGenerator, UuidGenerator};
pub use store::{StoreError, StoreResult};

use serde_json::Value;

/// Applies `changes` to `mixtape` with random UUID collection ids.
///
/// # Errors
/// - `InvalidArgument` naming `mixtape` or `changes` when either input is not
///   a JSON object; `mixtape` is checked first. Both roots are checked
///   before either is decoded.
/// - `Malformed` when a required key is missing or mistyped.
pub fn apply_changes(mixtape: Value, changes: Value) -> ModelResult<(Value, ChangeReport)> {
    apply_changes_with(mixtape, changes, UuidGenerator)
}

/// Same as [`apply_changes`] with a caller-provided id source.
pub fn apply_changes_with<G: IdGenerator>(
    mixtape: Value,
    changes: Value,
    ids: G,
) -> ModelResult<(Value, ChangeReport)> {
    ensure_object(MIXTAPE_PARAMETER, &mixtape)?;
    ensure_object(CHANGES_PARAMETER, &changes)?;

    let mut document = Document::from_value(mixtape)?;
    let request = ChangeRequest::from_value(changes)?;

    let report = ChangeProcessor::with_id_generator(&mut document, &request, ids).run();
    Ok((document.to_value()?, report))
}
