//! Three-phase change processor.
//!
//! # Responsibility
//! - Delete collections, append items to existing collections, then create
//!   new collections, in that fixed order.
//! - Enforce referential rules before committing each mutation.
//!
//! # Invariants
//! - Later phases observe the effects of earlier ones.
//! - Appended or stored item ids always resolve at commit time.
//! - A new collection is committed whole or not at all.
//! - Generated collection ids never collide with stored ones.
//! - `run()` is not idempotent; a second run re-applies the request to the
//!   already-mutated document.

use crate::lookup::document_lookup::DocumentLookup;
use crate::model::change::{ChangeRequest, NewCollection};
use crate::model::document::{Collection, CollectionEntry, CollectionId, Document, ItemId};
use crate::service::change_report::{ChangePhase, ChangeRecord, ChangeReport, RejectReason};
use crate::service::id_generator::{IdGenerator, UuidGenerator};
use log::{debug, info, warn};

/// Upper bound on candidate ids drawn for one new collection.
pub const MAX_ID_ATTEMPTS: usize = 16;

/// Applies one change request to one document held by exclusive borrow.
pub struct ChangeProcessor<'a, G: IdGenerator = UuidGenerator> {
    document: &'a mut Document,
    changes: &'a ChangeRequest,
    ids: G,
}

impl<'a> ChangeProcessor<'a, UuidGenerator> {
    /// Creates a processor generating random UUID collection ids.
    pub fn new(document: &'a mut Document, changes: &'a ChangeRequest) -> Self {
        Self::with_id_generator(document, changes, UuidGenerator)
    }
}

impl<'a, G: IdGenerator> ChangeProcessor<'a, G> {
    /// Creates a processor using a caller-provided id source.
    pub fn with_id_generator(
        document: &'a mut Document,
        changes: &'a ChangeRequest,
        ids: G,
    ) -> Self {
        info!(
            "event=processor_init module=processor status=ok collections={} deletions={} updates={} new_collections={}",
            document.collection_count(),
            changes.deletion_ids().map_or(0, <[_]>::len),
            changes
                .additions
                .as_ref()
                .map_or(0, |additions| additions.existing_collections_to_update.len()),
            changes
                .additions
                .as_ref()
                .map_or(0, |additions| additions.new_collections.len()),
        );
        Self {
            document,
            changes,
            ids,
        }
    }

    /// Current state of the document under change.
    pub fn document(&self) -> &Document {
        &*self.document
    }

    /// Runs deletions, then updates, then creations.
    pub fn run(&mut self) -> ChangeReport {
        let mut report = self.process_deletions();
        report.extend(self.process_collection_updates());
        report.extend(self.process_new_collections());

        info!(
            "event=processor_run module=processor status=ok applied={} skipped={} rejected={} collections={}",
            report.applied_count(),
            report.skipped_count(),
            report.rejected_count(),
            self.document.collection_count()
        );
        report
    }

    /// Removes every requested collection that exists; misses are skipped.
    pub fn process_deletions(&mut self) -> ChangeReport {
        let mut report = ChangeReport::default();
        let changes = self.changes;

        let Some(collection_ids) = changes.deletion_ids() else {
            info!("event=collection_delete module=processor status=noop reason=no_deletions");
            return report;
        };

        for collection_id in collection_ids {
            debug!(
                "event=collection_delete module=processor status=start collection_id={}",
                collection_id
            );
            let position = self.lookup().position_of(collection_id);
            let removed = match (position, self.document.collections.as_mut()) {
                (Some(position), Some(collections)) => {
                    collections.remove(position);
                    true
                }
                _ => false,
            };

            if removed {
                info!(
                    "event=collection_delete module=processor status=ok collection_id={}",
                    collection_id
                );
                report.push(ChangeRecord::deleted(collection_id.as_str()));
            } else {
                info!(
                    "event=collection_delete module=processor status=skipped reason=not_found collection_id={}",
                    collection_id
                );
                report.push(ChangeRecord::not_found(
                    ChangePhase::Deletion,
                    collection_id.as_str(),
                ));
            }
        }

        report
    }

    /// Appends existing items to existing collections.
    ///
    /// Items that do not exist are dropped one by one; an unresolved target
    /// collection skips the whole update.
    pub fn process_collection_updates(&mut self) -> ChangeReport {
        let mut report = ChangeReport::default();
        let changes = self.changes;

        let Some(additions) = changes.additions.as_ref() else {
            info!("event=collection_update module=processor status=noop reason=no_additions");
            return report;
        };
        if additions.existing_collections_to_update.is_empty() {
            info!("event=collection_update module=processor status=noop reason=no_updates");
            return report;
        }
        if self.document.collection_count() == 0 {
            info!("event=collection_update module=processor status=noop reason=no_collections");
            return report;
        }

        for update in &additions.existing_collections_to_update {
            let lookup = self.lookup();
            let Some(position) = lookup.position_of(&update.id) else {
                info!(
                    "event=collection_update module=processor status=skipped reason=not_found collection_id={}",
                    update.id
                );
                report.push(ChangeRecord::not_found(
                    ChangePhase::Update,
                    update.id.as_str(),
                ));
                continue;
            };

            let (accepted, dropped): (Vec<ItemId>, Vec<ItemId>) = update
                .items
                .iter()
                .cloned()
                .partition(|item_id| lookup.item_exists(item_id));

            if let Some(entry) = self
                .document
                .collections
                .as_mut()
                .and_then(|collections| collections.get_mut(position))
            {
                entry.collection.append_items(accepted.iter().cloned());
            }

            if !dropped.is_empty() {
                warn!(
                    "event=collection_update module=processor status=partial collection_id={} dropped_items={}",
                    update.id,
                    dropped.join(",")
                );
            }
            info!(
                "event=collection_update module=processor status=ok collection_id={} appended={}",
                update.id,
                accepted.len()
            );
            report.push(ChangeRecord::updated(update.id.as_str(), accepted, dropped));
        }

        report
    }

    /// Creates every valid new collection; invalid requests are rejected whole.
    pub fn process_new_collections(&mut self) -> ChangeReport {
        let mut report = ChangeReport::default();
        let changes = self.changes;

        let Some(additions) = changes.additions.as_ref() else {
            info!("event=collection_create module=processor status=noop reason=no_additions");
            return report;
        };
        if additions.new_collections.is_empty() {
            info!("event=collection_create module=processor status=noop reason=no_new_collections");
            return report;
        }

        for request in &additions.new_collections {
            let items = match self.validate_new_collection(request) {
                Ok(items) => items,
                Err(reason) => {
                    warn!(
                        "event=collection_create module=processor status=rejected owner_id={} reason=\"{}\"",
                        request.owner_id, reason
                    );
                    report.push(ChangeRecord::rejected(request.name.as_str(), reason));
                    continue;
                }
            };

            let Some(collection_id) = self.fresh_collection_id() else {
                let reason = RejectReason::IdentifierExhausted {
                    attempts: MAX_ID_ATTEMPTS,
                };
                warn!(
                    "event=collection_create module=processor status=rejected owner_id={} reason=\"{}\"",
                    request.owner_id, reason
                );
                report.push(ChangeRecord::rejected(request.name.as_str(), reason));
                continue;
            };

            self.document
                .collections_mut()
                .push(CollectionEntry::new(Collection::new(
                    collection_id.as_str(),
                    request.name.as_str(),
                    request.owner_id.as_str(),
                    items.to_vec(),
                )));

            info!(
                "event=collection_create module=processor status=ok collection_id={} owner_id={} items={}",
                collection_id,
                request.owner_id,
                items.len()
            );
            report.push(ChangeRecord::created(
                collection_id,
                request.name.as_str(),
                items.to_vec(),
            ));
        }

        report
    }

    fn lookup(&self) -> DocumentLookup<'_> {
        DocumentLookup::new(&*self.document)
    }

    fn validate_new_collection<'r>(
        &self,
        request: &'r NewCollection,
    ) -> Result<&'r [ItemId], RejectReason> {
        let lookup = self.lookup();

        if !lookup.user_exists(&request.owner_id) {
            return Err(RejectReason::UnknownOwner(request.owner_id.clone()));
        }
        let Some(items) = request.items.as_deref() else {
            return Err(RejectReason::MissingItems);
        };
        if items.is_empty() {
            return Err(RejectReason::EmptyItems);
        }
        if let Some(missing) = lookup.first_missing_item(items) {
            return Err(RejectReason::MissingItem(missing.to_string()));
        }

        Ok(items)
    }

    fn fresh_collection_id(&mut self) -> Option<CollectionId> {
        for attempt in 1..=MAX_ID_ATTEMPTS {
            let candidate = self.ids.next_id();
            if !self.lookup().collection_id_taken(&candidate) {
                return Some(candidate);
            }
            warn!(
                "event=collection_id module=processor status=collision attempt={} collection_id={}",
                attempt, candidate
            );
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::{ChangeProcessor, MAX_ID_ATTEMPTS};
    use crate::model::change::{Additions, ChangeRequest, NewCollection};
    use crate::model::document::{Collection, CollectionEntry, Document, Item, User};
    use crate::service::change_report::{ChangeOutcome, RejectReason};
    use crate::service::id_generator::IdGenerator;
    use serde_json::json;

    struct FixedIdGenerator(&'static str);

    impl IdGenerator for FixedIdGenerator {
        fn next_id(&mut self) -> String {
            self.0.to_string()
        }
    }

    #[test]
    fn creation_gives_up_when_every_candidate_collides() {
        let mut document = Document {
            users: Some(vec![User::new("u1")]),
            collections: Some(vec![CollectionEntry::new(Collection::new(
                "taken",
                "Existing",
                "u1",
                vec!["s1".into()],
            ))]),
            items: Some(vec![Item::new("s1")]),
            ..Document::default()
        };
        let changes = ChangeRequest {
            deletions: None,
            additions: Some(Additions {
                existing_collections_to_update: Vec::new(),
                new_collections: vec![NewCollection::new("u1", "Dup", Some(vec!["s1".into()]))],
            }),
        };

        let report = ChangeProcessor::with_id_generator(
            &mut document,
            &changes,
            FixedIdGenerator("taken"),
        )
        .run();

        assert_eq!(document.collection_count(), 1);
        assert_eq!(
            report.records()[0].outcome,
            ChangeOutcome::Rejected(RejectReason::IdentifierExhausted {
                attempts: MAX_ID_ATTEMPTS,
            })
        );
    }

    #[test]
    fn creation_into_document_without_collections_key_creates_it() {
        let mut document = Document {
            users: Some(vec![User::new("u1")]),
            items: Some(vec![Item::new("s1")]),
            ..Document::default()
        };
        let changes = ChangeRequest {
            deletions: None,
            additions: Some(Additions {
                existing_collections_to_update: Vec::new(),
                new_collections: vec![NewCollection::new("u1", "First", Some(vec!["s1".into()]))],
            }),
        };

        let report = ChangeProcessor::with_id_generator(
            &mut document,
            &changes,
            FixedIdGenerator("fresh"),
        )
        .run();

        assert_eq!(report.created_ids(), vec!["fresh"]);
        let stored: Vec<_> = document.iter_collections().collect();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, "fresh");
        assert_eq!(stored[0].owner_id, "u1");
    }
    #[test]
    fn creation_replaces_null_collections_with_single_key() {
        let mut document = Document::from_value(json!({
            "users": [{"user_id": "u1"}],
            "collections": null,
            "items": [{"id": "s1"}]
        }))
        .unwrap();
        let changes = ChangeRequest {
            deletions: None,
            additions: Some(Additions {
                existing_collections_to_update: Vec::new(),
                new_collections: vec![NewCollection::new("u1", "First", Some(vec!["s1".into()]))],
            }),
        };

        ChangeProcessor::with_id_generator(&mut document, &changes, FixedIdGenerator("fresh"))
            .run();

        let value = document.to_value().unwrap();
        let root = value.as_object().unwrap();
        assert_eq!(root.keys().filter(|key| *key == "collections").count(), 1);
        assert_eq!(value["collections"][0]["collection"]["id"], "fresh");
        assert!(!document.extra.contains_key("collections"));
    }
}
