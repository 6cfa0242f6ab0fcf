//! Linear-scan lookups used by the change processor.

use crate::model::document::{Collection, Document};
use log::{debug, info};

/// Read-only view resolving references inside one document.
#[derive(Debug, Clone, Copy)]
pub struct DocumentLookup<'doc> {
    document: &'doc Document,
}

impl<'doc> DocumentLookup<'doc> {
    pub fn new(document: &'doc Document) -> Self {
        Self { document }
    }

    /// Returns the first collection whose id matches.
    pub fn find_collection(&self, collection_id: &str) -> Option<&'doc Collection> {
        self.position_of(collection_id)
            .and_then(|position| self.document.collections.as_ref()?.get(position))
            .map(|entry| &entry.collection)
    }

    /// Returns the index of the first collection whose id matches.
    ///
    /// A miss is logged at info level.
    pub fn position_of(&self, collection_id: &str) -> Option<usize> {
        let position = self
            .document
            .iter_collections()
            .position(|collection| collection.id == collection_id);

        if position.is_none() {
            info!(
                "event=collection_lookup module=lookup status=not_found collection_id={}",
                collection_id
            );
        }
        position
    }

    /// Whether any stored collection already uses `collection_id`.
    ///
    /// Unlike `position_of`, a miss here is the expected case and is not logged.
    pub fn collection_id_taken(&self, collection_id: &str) -> bool {
        self.document
            .iter_collections()
            .any(|collection| collection.id == collection_id)
    }

    pub fn item_exists(&self, item_id: &str) -> bool {
        let Some(items) = self.document.items.as_ref() else {
            info!("event=item_lookup module=lookup status=not_found reason=no_items_defined");
            return false;
        };

        let found = items.iter().any(|item| item.id == item_id);
        if !found {
            debug!(
                "event=item_lookup module=lookup status=not_found item_id={}",
                item_id
            );
        }
        found
    }

    pub fn user_exists(&self, user_id: &str) -> bool {
        let Some(users) = self.document.users.as_ref() else {
            info!("event=user_lookup module=lookup status=not_found reason=no_users_defined");
            return false;
        };

        users.iter().any(|user| user.user_id == user_id)
    }

    /// True iff every id resolves to an item. Stops at the first miss.
    pub fn all_items_exist<S: AsRef<str>>(&self, item_ids: &[S]) -> bool {
        self.first_missing_item(item_ids).is_none()
    }

    /// Returns the first id in `item_ids` that does not resolve to an item.
    pub fn first_missing_item<'ids, S: AsRef<str>>(
        &self,
        item_ids: &'ids [S],
    ) -> Option<&'ids str> {
        item_ids
            .iter()
            .map(|item_id| item_id.as_ref())
            .find(|item_id| !self.item_exists(item_id))
    }
}
