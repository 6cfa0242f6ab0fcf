//! Structured outcomes of a change run.
//!
//! # Responsibility
//! - Record what happened to every requested operation.
//! - Let callers assert on outcomes instead of parsing log text.

use crate::model::document::{CollectionId, ItemId, UserId};
use std::fmt::{Display, Formatter};

/// Phase a record was produced by, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChangePhase {
    Deletion,
    Update,
    Creation,
}

/// Why a new-collection request was dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// `owner_id` does not resolve to a user.
    UnknownOwner(UserId),
    /// Request carries no `items` key.
    MissingItems,
    /// Request carries an empty `items` list.
    EmptyItems,
    /// At least one referenced item does not exist; first miss shown.
    MissingItem(ItemId),
    /// Every generated identifier collided with a stored collection.
    IdentifierExhausted { attempts: usize },
}

/// Result of one requested operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeOutcome {
    Applied,
    SkippedNotFound,
    Rejected(RejectReason),
}

/// One entry per requested operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRecord {
    pub phase: ChangePhase,
    /// Target id for deletions/updates, generated id for created collections.
    pub collection_id: Option<CollectionId>,
    /// Requested name; creation only.
    pub name: Option<String>,
    pub outcome: ChangeOutcome,
    /// Items appended by an update or stored by a creation, in order.
    pub items: Vec<ItemId>,
    /// Items an update dropped because they do not exist.
    pub dropped_items: Vec<ItemId>,
}

impl ChangeRecord {
    pub fn deleted(collection_id: impl Into<CollectionId>) -> Self {
        Self::base(
            ChangePhase::Deletion,
            Some(collection_id.into()),
            ChangeOutcome::Applied,
        )
    }

    pub fn not_found(phase: ChangePhase, collection_id: impl Into<CollectionId>) -> Self {
        Self::base(
            phase,
            Some(collection_id.into()),
            ChangeOutcome::SkippedNotFound,
        )
    }

    pub fn updated(
        collection_id: impl Into<CollectionId>,
        items: Vec<ItemId>,
        dropped_items: Vec<ItemId>,
    ) -> Self {
        Self {
            items,
            dropped_items,
            ..Self::base(
                ChangePhase::Update,
                Some(collection_id.into()),
                ChangeOutcome::Applied,
            )
        }
    }

    pub fn created(
        collection_id: impl Into<CollectionId>,
        name: impl Into<String>,
        items: Vec<ItemId>,
    ) -> Self {
        Self {
            name: Some(name.into()),
            items,
            ..Self::base(
                ChangePhase::Creation,
                Some(collection_id.into()),
                ChangeOutcome::Applied,
            )
        }
    }

    pub fn rejected(name: impl Into<String>, reason: RejectReason) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::base(ChangePhase::Creation, None, ChangeOutcome::Rejected(reason))
        }
    }

    pub fn is_applied(&self) -> bool {
        self.outcome == ChangeOutcome::Applied
    }

    fn base(
        phase: ChangePhase,
        collection_id: Option<CollectionId>,
        outcome: ChangeOutcome,
    ) -> Self {
        Self {
            phase,
            collection_id,
            name: None,
            outcome,
            items: Vec::new(),
            dropped_items: Vec::new(),
        }
    }
}

/// Ordered list of records produced by one or more phases.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeReport {
    records: Vec<ChangeRecord>,
}

impl ChangeReport {
    pub fn push(&mut self, record: ChangeRecord) {
        self.records.push(record);
    }

    /// Appends every record of `other`, keeping order.
    pub fn extend(&mut self, other: ChangeReport) {
        self.records.extend(other.records);
    }

    pub fn records(&self) -> &[ChangeRecord] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn for_phase(&self, phase: ChangePhase) -> impl Iterator<Item = &ChangeRecord> {
        self.records
            .iter()
            .filter(move |record| record.phase == phase)
    }

    pub fn applied_count(&self) -> usize {
        self.records.iter().filter(|record| record.is_applied()).count()
    }

    pub fn skipped_count(&self) -> usize {
        self.count_outcome(|outcome| matches!(outcome, ChangeOutcome::SkippedNotFound))
    }

    pub fn rejected_count(&self) -> usize {
        self.count_outcome(|outcome| matches!(outcome, ChangeOutcome::Rejected(_)))
    }

    /// Ids of collections created during the run, in creation order.
    pub fn created_ids(&self) -> Vec<&str> {
        self.for_phase(ChangePhase::Creation)
            .filter(|record| record.is_applied())
            .filter_map(|record| record.collection_id.as_deref())
            .collect()
    }

    fn count_outcome(&self, predicate: impl Fn(&ChangeOutcome) -> bool) -> usize {
        self.records
            .iter()
            .filter(|record| predicate(&record.outcome))
            .count()
    }
}

impl Display for ChangePhase {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Deletion => "delete",
            Self::Update => "update",
            Self::Creation => "create",
        };
        f.write_str(label)
    }
}

impl Display for RejectReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownOwner(user_id) => write!(f, "owner {user_id} not found"),
            Self::MissingItems => write!(f, "no items key present"),
            Self::EmptyItems => write!(f, "items must contain one or more ids"),
            Self::MissingItem(item_id) => write!(f, "item {item_id} does not exist"),
            Self::IdentifierExhausted { attempts } => write!(
                f,
                "no unique collection id after {attempts} attempts"
            ),
        }
    }
}

impl Display for ChangeOutcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Applied => f.write_str("applied"),
            Self::SkippedNotFound => f.write_str("skipped: collection not found"),
            Self::Rejected(reason) => write!(f, "rejected: {reason}"),
        }
    }
}

impl Display for ChangeRecord {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.phase)?;
        if let Some(collection_id) = &self.collection_id {
            write!(f, " {collection_id}")?;
        }
        if let Some(name) = &self.name {
            write!(f, " \"{name}\"")?;
        }
        write!(f, ": {}", self.outcome)?;
        if !self.dropped_items.is_empty() {
            write!(f, " (dropped {})", self.dropped_items.join(","))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ChangePhase, ChangeRecord, ChangeReport, RejectReason};

    #[test]
    fn counts_split_by_outcome() {
        let mut report = ChangeReport::default();
        report.push(ChangeRecord::deleted("c1"));
        report.push(ChangeRecord::not_found(ChangePhase::Update, "c9"));
        report.push(ChangeRecord::rejected("Mix", RejectReason::EmptyItems));
        report.push(ChangeRecord::created("n1", "Mix", vec!["s1".into()]));

        assert_eq!(report.len(), 4);
        assert_eq!(report.applied_count(), 2);
        assert_eq!(report.skipped_count(), 1);
        assert_eq!(report.rejected_count(), 1);
        assert_eq!(report.created_ids(), vec!["n1"]);
        assert_eq!(report.for_phase(ChangePhase::Creation).count(), 2);
    }

    #[test]
    fn display_is_one_summary_line() {
        let updated = ChangeRecord::updated("c2", vec!["s1".into()], vec!["s7".into()]);
        assert_eq!(updated.to_string(), "update c2: applied (dropped s7)");

        let rejected = ChangeRecord::rejected(
            "Road Trip",
            RejectReason::UnknownOwner("u9".to_string()),
        );
        assert_eq!(
            rejected.to_string(),
            "create \"Road Trip\": rejected: owner u9 not found"
        );

        let skipped = ChangeRecord::not_found(ChangePhase::Deletion, "c4");
        assert_eq!(skipped.to_string(), "delete c4: skipped: collection not found");
    }
}
