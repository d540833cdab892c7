//! Ordering scoped to groups inside a container.
//!
//! Items carry a [`GroupKey`] and positions are dense per
//! `(container, group)`: an item's `sort_order` is only meaningful relative
//! to its own group. Moving an item to another group appends it at the tail
//! of the destination and closes the gap it leaves behind.

use crate::engine::{load_active_item, with_ids, OrderedListEngine, Scope, Variant};
use crate::normalize::{position_at, Normalizer};
use crate::tracker::{ChangeTracker, Field};
use crate::{
    AuditAction, AuditEmitter, AuditEvent, GroupKey, Item, ItemChanges, ItemId, NewItem,
    OrderStore, Result, TargetType, Timestamp,
};
use serde_json::json;

/// Ordered task items, kept dense and zero-based within each group.
pub struct GroupedOrderedListEngine<S, A> {
    inner: OrderedListEngine<S, A>,
}

impl<S: OrderStore, A: AuditEmitter> GroupedOrderedListEngine<S, A> {
    pub fn new(store: S, audit: A) -> Self {
        Self {
            inner: OrderedListEngine::new(store, audit),
        }
    }

    pub fn store(&self) -> &S {
        self.inner.store()
    }

    pub fn store_mut(&mut self) -> &mut S {
        self.inner.store_mut()
    }

    pub fn audit(&self) -> &A {
        self.inner.audit()
    }

    /// Take back the store and emitter.
    pub fn into_parts(self) -> (S, A) {
        self.inner.into_parts()
    }

    /// The engine for the container's ungrouped lane, over the same store
    /// and emitter.
    pub fn ungrouped(&mut self) -> &mut OrderedListEngine<S, A> {
        &mut self.inner
    }

    /// Active items of one group in position order.
    pub fn list(&self, container: &str, group: &GroupKey) -> Result<Vec<Item>> {
        self.inner
            .store
            .load_active(container, Some(&group.clone().normalized()))
    }

    /// Insert a new item into `group` at the requested position.
    pub fn create(
        &mut self,
        container: &str,
        group: GroupKey,
        new: NewItem,
        now: Timestamp,
    ) -> Result<Item> {
        self.inner
            .create_in(Scope::group(container, group.normalized()), new, now)
    }

    /// Apply content, done-flag and within-group position changes.
    pub fn update(
        &mut self,
        container: &str,
        id: &str,
        changes: ItemChanges,
        now: Timestamp,
    ) -> Result<Item> {
        self.inner
            .update_item(container, id, changes, Variant::Grouped, now)
    }

    /// Tombstone an item and close the gap in its group.
    pub fn delete(&mut self, container: &str, id: &str, now: Timestamp) -> Result<()> {
        self.inner.delete_item(container, id, Variant::Grouped, now)
    }

    /// Replace one group's order with `ordered_ids`.
    pub fn reorder(
        &mut self,
        container: &str,
        group: GroupKey,
        ordered_ids: &[ItemId],
        now: Timestamp,
    ) -> Result<Vec<Item>> {
        self.inner
            .reorder_in(Scope::group(container, group.normalized()), ordered_ids, now)
    }

    /// Move an item to another group, appending it at the destination tail.
    ///
    /// An ungrouped item leaves the container's ungrouped lane, which is
    /// renormalized like any source group. Reassigning to the item's current
    /// group (lane and qualifier equal) is a no-op and publishes nothing.
    pub fn reassign_group(
        &mut self,
        container: &str,
        id: &str,
        group: GroupKey,
        now: Timestamp,
    ) -> Result<Item> {
        let group = group.normalized();

        let (outcome, item) = self.inner.store.transaction(|store| {
            let mut item = load_active_item(store, container, id)?;
            let from = item.group_key.clone();
            if from.as_ref() == Some(&group) {
                return Ok((None, item));
            }
            let snapshot = ChangeTracker::snapshot(&item, Field::GROUPED);

            item.group_key = Some(group.clone());
            item.updated_at = now;
            store.persist(&item)?;

            let mut source = store.load_active(container, from.as_ref())?;
            Normalizer::normalize(store, &mut source, now)?;
            Normalizer::check_dense(&source)?;

            let mut destination: Vec<Item> = store
                .load_active(container, Some(&group))?
                .into_iter()
                .filter(|other| other.id != item.id)
                .collect();
            Normalizer::normalize(store, &mut destination, now)?;

            // size counts the moving item, which takes the last slot
            let size = destination.len() + 1;
            item.sort_order = position_at(size.saturating_sub(1))?;
            store.persist(&item)?;
            destination.push(item.clone());
            Normalizer::normalize(store, &mut destination, now)?;
            Normalizer::check_dense(&destination)?;

            let changes = ChangeTracker::diff(&snapshot, &item, Field::GROUPED);
            Ok((changes.map(|c| (from, c)), item))
        })?;

        let Some((from, changes)) = outcome else {
            tracing::debug!(container, item = %item.id, group = %group, "item already in group");
            return Ok(item);
        };

        tracing::debug!(
            container,
            item = %item.id,
            position = item.sort_order,
            group = %group,
            "item moved to group"
        );
        let mut metadata = changes.to_json();
        metadata["fromGroup"] = json!(from);
        metadata["toGroup"] = json!(group);
        self.inner.audit.publish(AuditEvent::new(
            container,
            AuditAction::GroupChanged,
            TargetType::Item,
            item.id.clone(),
            with_ids(container, &item.id, metadata),
        ));
        Ok(item)
    }
}
