//! Mixtape document model.
//!
//! # Responsibility
//! - Describe users, collections and items as read from the source document.
//! - Carry unknown attributes through untouched.
//!
//! # Invariants
//! - Collection ids are unique within `collections`.
//! - A top-level key absent on input stays absent on output unless the
//!   engine commits a collection into it. A known key holding `null` is
//!   written back as `null` under the same rule.
//! - A collection stored without `items` is written back without `items`
//!   until an item is appended to it.

use super::{decode_object, ensure_object, ModelError, ModelResult, MIXTAPE_PARAMETER};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Identifier of a collection inside one document.
pub type CollectionId = String;
/// Identifier of an item inside one document.
pub type ItemId = String;
/// Identifier of a user inside one document.
pub type UserId = String;

/// Top-level keys decoded into typed fields of [`Document`].
const TYPED_KEYS: [&str; 3] = ["users", "collections", "items"];

/// Root aggregate mutated by the change processor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub users: Option<Vec<User>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collections: Option<Vec<CollectionEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<Item>>,
    /// Top-level keys the engine does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Collection owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub user_id: UserId,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Referenceable item. Only `id` is interpreted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Wrapper object stored in `collections`: `{"collection": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionEntry {
    pub collection: Collection,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Named, ordered list of item references owned by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub id: CollectionId,
    pub name: String,
    pub owner_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<ItemId>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Document {
    /// Builds a document from a parsed JSON tree.
    ///
    /// # Errors
    /// - `InvalidArgument` naming `mixtape` when `value` is not an object.
    /// - `Malformed` when a required key is missing or mistyped.
    pub fn from_value(value: Value) -> ModelResult<Self> {
        ensure_object(MIXTAPE_PARAMETER, &value)?;

        // `null` under a typed key would decode to `None` and vanish on output.
        let mut nulls = Map::new();
        let value = match value {
            Value::Object(root) => Value::Object(
                root.into_iter()
                    .filter_map(|(key, field)| {
                        if field.is_null() && TYPED_KEYS.contains(&key.as_str()) {
                            nulls.insert(key, field);
                            None
                        } else {
                            Some((key, field))
                        }
                    })
                    .collect(),
            ),
            other => other,
        };

        let mut document: Self = decode_object(MIXTAPE_PARAMETER, value)?;
        document.extra.extend(nulls);
        Ok(document)
    }

    /// Renders the document back to a JSON tree.
    pub fn to_value(&self) -> ModelResult<Value> {
        serde_json::to_value(self).map_err(|err| ModelError::Encode(err.to_string()))
    }

    /// Number of collections currently stored.
    pub fn collection_count(&self) -> usize {
        self.collections.as_ref().map_or(0, Vec::len)
    }

    /// Iterates the unwrapped collections in stored order.
    pub fn iter_collections(&self) -> impl Iterator<Item = &Collection> {
        self.collections
            .iter()
            .flatten()
            .map(|entry| &entry.collection)
    }

    /// Stored collections, creating the list when absent or `null`.
    pub fn collections_mut(&mut self) -> &mut Vec<CollectionEntry> {
        self.extra.remove("collections");
        self.collections.get_or_insert_with(Vec::new)
    }
}

impl CollectionEntry {
    pub fn new(collection: Collection) -> Self {
        Self {
            collection,
            extra: Map::new(),
        }
    }
}

impl Collection {
    /// Creates a collection with no extra attributes.
    pub fn new(
        id: impl Into<CollectionId>,
        name: impl Into<String>,
        owner_id: impl Into<UserId>,
        items: Vec<ItemId>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            owner_id: owner_id.into(),
            items: Some(items),
            extra: Map::new(),
        }
    }

    /// Item references in stored order; empty when `items` is absent.
    pub fn items(&self) -> &[ItemId] {
        self.items.as_deref().unwrap_or_default()
    }

    /// Appends item references, creating `items` only when there is one to add.
    pub fn append_items<I: IntoIterator<Item = ItemId>>(&mut self, item_ids: I) {
        let mut item_ids = item_ids.into_iter().peekable();
        if item_ids.peek().is_some() {
            self.items.get_or_insert_with(Vec::new).extend(item_ids);
        }
    }
}

impl User {
    pub fn new(user_id: impl Into<UserId>) -> Self {
        Self {
            user_id: user_id.into(),
            extra: Map::new(),
        }
    }
}

impl Item {
    pub fn new(id: impl Into<ItemId>) -> Self {
        Self {
            id: id.into(),
            extra: Map::new(),
        }
    }
}
