//! Change request model.
//!
//! # Responsibility
//! - Describe deletions, updates to existing collections and new collections.
//!
//! # Invariants
//! - `NewCollection::items` keeps "key missing" (`None`) distinct from an
//!   empty list; both are rejected, for different reasons.
//! - A `deletions` section without a nested `collections` key is a no-op.

use super::document::{CollectionId, ItemId, UserId};
use super::{decode_object, ModelResult, CHANGES_PARAMETER};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Declarative instruction set applied to one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deletions: Option<Deletions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additions: Option<Additions>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deletions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collections: Option<Vec<CollectionId>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Additions {
    #[serde(default)]
    pub existing_collections_to_update: Vec<CollectionUpdate>,
    #[serde(default)]
    pub new_collections: Vec<NewCollection>,
}

/// Items to append to an existing collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionUpdate {
    pub id: CollectionId,
    #[serde(default)]
    pub items: Vec<ItemId>,
}

/// Collection to create for an existing owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCollection {
    pub owner_id: UserId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<ItemId>>,
}

impl ChangeRequest {
    /// Builds a change request from a parsed JSON tree.
    ///
    /// # Errors
    /// - `InvalidArgument` naming `changes` when `value` is not an object.
    /// - `Malformed` when a required key is missing or mistyped.
    pub fn from_value(value: Value) -> ModelResult<Self> {
        decode_object(CHANGES_PARAMETER, value)
    }

    /// Collection ids to delete, if the request carries any.
    pub fn deletion_ids(&self) -> Option<&[CollectionId]> {
        self.deletions
            .as_ref()
            .and_then(|deletions| deletions.collections.as_deref())
    }
}

impl CollectionUpdate {
    pub fn new(id: impl Into<CollectionId>, items: Vec<ItemId>) -> Self {
        Self {
            id: id.into(),
            items,
        }
    }
}

impl NewCollection {
    pub fn new(
        owner_id: impl Into<UserId>,
        name: impl Into<String>,
        items: Option<Vec<ItemId>>,
    ) -> Self {
        Self {
            owner_id: owner_id.into(),
            name: name.into(),
            items,
        }
    }
}
