//! The single-lane ordering engine.
//!
//! Every public operation runs as one store transaction following the same
//! pipeline: load the active set, snapshot, apply the algorithm, renumber,
//! persist, diff, and publish an audit event only when something changed.
//! Creation and deletion always publish.

use crate::item::checked_content;
use crate::normalize::{insert_index, move_index, move_item, position_at, Normalizer};
use crate::tracker::{ChangeTracker, Field};
use crate::{
    AuditAction, AuditEmitter, AuditEvent, ContainerId, Error, GroupKey, Item, ItemChanges,
    ItemId, NewItem, OrderStore, Result, TargetType, Timestamp,
};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};

/// Ordering scope: a whole container, or one group inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Scope {
    pub container: ContainerId,
    pub group: Option<GroupKey>,
}

impl Scope {
    pub fn lane(container: &str) -> Self {
        Self {
            container: container.to_string(),
            group: None,
        }
    }

    pub fn group(container: &str, group: GroupKey) -> Self {
        Self {
            container: container.to_string(),
            group: Some(group),
        }
    }

    fn load<S: OrderStore>(&self, store: &S) -> Result<Vec<Item>> {
        store.load_active(&self.container, self.group.as_ref())
    }
}

/// Which engine variant an item-level operation runs under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Variant {
    /// Positions are dense over the container's ungrouped items.
    Lane,
    /// Positions are dense per `(container, group)`.
    Grouped,
}

impl Variant {
    pub fn fields(self) -> &'static [Field] {
        match self {
            Variant::Lane => Field::LANE,
            Variant::Grouped => Field::GROUPED,
        }
    }

    fn scope_of(self, item: &Item) -> Scope {
        Scope {
            container: item.container_id.clone(),
            group: match self {
                Variant::Lane => None,
                Variant::Grouped => item.group_key.clone(),
            },
        }
    }
}

/// Load an active item of `container`, or fail with `NotFound`.
pub(crate) fn load_active_item<S: OrderStore>(store: &S, container: &str, id: &str) -> Result<Item> {
    store
        .load_one(container, id)?
        .filter(Item::is_active)
        .ok_or_else(|| Error::NotFound(format!("item {id} in container {container}")))
}

/// Load an active item whose scope matches `variant`.
pub(crate) fn load_target<S: OrderStore>(
    store: &S,
    container: &str,
    id: &str,
    variant: Variant,
) -> Result<Item> {
    let item = load_active_item(store, container, id)?;

    match (variant, &item.group_key) {
        (Variant::Grouped, None) => Err(Error::InvalidRequest(format!(
            "item {id} is not assigned to a group"
        ))),
        (Variant::Lane, Some(group)) => Err(Error::InvalidRequest(format!(
            "item {id} belongs to group {group}"
        ))),
        _ => Ok(item),
    }
}

/// Ordered task items of a container, kept dense and zero-based.
pub struct OrderedListEngine<S, A> {
    pub(crate) store: S,
    pub(crate) audit: A,
}

impl<S: OrderStore, A: AuditEmitter> OrderedListEngine<S, A> {
    pub fn new(store: S, audit: A) -> Self {
        Self { store, audit }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn audit(&self) -> &A {
        &self.audit
    }

    /// Take back the store and emitter.
    pub fn into_parts(self) -> (S, A) {
        (self.store, self.audit)
    }

    /// Active ungrouped items of a container in position order.
    pub fn list(&self, container: &str) -> Result<Vec<Item>> {
        Scope::lane(container).load(&self.store)
    }

    /// Insert a new item at the requested position (tail when absent).
    pub fn create(&mut self, container: &str, new: NewItem, now: Timestamp) -> Result<Item> {
        self.create_in(Scope::lane(container), new, now)
    }

    /// Apply content, done-flag and position changes to one item.
    pub fn update(
        &mut self,
        container: &str,
        id: &str,
        changes: ItemChanges,
        now: Timestamp,
    ) -> Result<Item> {
        self.update_item(container, id, changes, Variant::Lane, now)
    }

    /// Tombstone an item and close the gap it leaves.
    pub fn delete(&mut self, container: &str, id: &str, now: Timestamp) -> Result<()> {
        self.delete_item(container, id, Variant::Lane, now)
    }

    /// Replace the container's order with `ordered_ids`.
    pub fn reorder(
        &mut self,
        container: &str,
        ordered_ids: &[ItemId],
        now: Timestamp,
    ) -> Result<Vec<Item>> {
        self.reorder_in(Scope::lane(container), ordered_ids, now)
    }

    pub(crate) fn create_in(&mut self, scope: Scope, new: NewItem, now: Timestamp) -> Result<Item> {
        let content = checked_content(&new.content)?;

        let item = self.store.transaction(|store| {
            let mut lane = scope.load(store)?;
            let position = position_at(insert_index(new.position, lane.len()))?;

            let mut item = Item::new(
                store.next_id(),
                scope.container.clone(),
                content,
                position,
                now,
            );
            item.group_key = scope.group.clone();
            if new.is_done == Some(true) {
                item.set_done(true, now);
            }
            store.persist(&item)?;

            // items at or after `position` shift one slot right
            let index = lane.partition_point(|existing| existing.sort_order < position);
            lane.insert(index, item);
            Normalizer::normalize(store, &mut lane, now)?;
            Normalizer::check_dense(&lane)?;

            Ok(lane.swap_remove(index))
        })?;

        tracing::debug!(
            container = %item.container_id,
            item = %item.id,
            position = item.sort_order,
            "item created"
        );
        let mut metadata = json!({
            "containerId": item.container_id,
            "itemId": item.id,
            "content": item.content,
            "isDone": item.is_done,
            "sortOrder": item.sort_order,
        });
        if let Some(group) = &item.group_key {
            metadata["groupKey"] = json!(group);
        }
        self.audit.publish(AuditEvent::new(
            item.container_id.clone(),
            AuditAction::ItemCreated,
            TargetType::Item,
            item.id.clone(),
            metadata,
        ));
        Ok(item)
    }

    pub(crate) fn update_item(
        &mut self,
        container: &str,
        id: &str,
        changes: ItemChanges,
        variant: Variant,
        now: Timestamp,
    ) -> Result<Item> {
        let fields = variant.fields();

        let (diff, item) = self.store.transaction(|store| {
            let mut item = load_target(store, container, id, variant)?;
            let snapshot = ChangeTracker::snapshot(&item, fields);

            if let Some(content) = changes.content.as_deref() {
                item.content = checked_content(content)?;
            }
            if let Some(done) = changes.is_done {
                item.set_done(done, now);
            }
            if let Some(target) = changes.position {
                let scope = variant.scope_of(&item);
                let mut lane = scope.load(store)?;
                Normalizer::normalize(store, &mut lane, now)?;

                let from = lane
                    .iter()
                    .position(|sibling| sibling.id == item.id)
                    .ok_or_else(|| {
                        Error::InvariantViolation(format!("item {id} missing from its own lane"))
                    })?;
                item.sort_order = lane[from].sort_order;

                let to = move_index(target, lane.len());
                if from == to {
                    tracing::debug!(item = %item.id, position = to, "move target is current position");
                } else {
                    lane[from] = item.clone();
                    move_item(&mut lane, from, to);
                    for index in Normalizer::renumber(&mut lane)? {
                        let sibling = &mut lane[index];
                        if sibling.id != item.id {
                            sibling.updated_at = now;
                            store.persist(sibling)?;
                        }
                    }
                    Normalizer::check_dense(&lane)?;
                    item.sort_order = lane[to].sort_order;
                }
            }

            let diff = ChangeTracker::diff(&snapshot, &item, fields);
            if diff.is_some() {
                item.updated_at = now;
                store.persist(&item)?;
            }
            Ok((diff.map(|d| d.to_json()), item))
        })?;

        match diff {
            Some(diff) => {
                tracing::debug!(container, item = %item.id, "item updated");
                self.audit.publish(AuditEvent::new(
                    container,
                    AuditAction::ItemUpdated,
                    TargetType::Item,
                    item.id.clone(),
                    with_ids(container, &item.id, diff),
                ));
            }
            None => tracing::debug!(container, item = %item.id, "update left item unchanged"),
        }
        Ok(item)
    }

    pub(crate) fn delete_item(
        &mut self,
        container: &str,
        id: &str,
        variant: Variant,
        now: Timestamp,
    ) -> Result<()> {
        let fields = variant.fields();

        let snapshot = self.store.transaction(|store| {
            let item = load_target(store, container, id, variant)?;
            let snapshot = ChangeTracker::snapshot(&item, fields);

            store.tombstone(&item.id, now)?;
            let mut lane = variant.scope_of(&item).load(store)?;
            Normalizer::normalize(store, &mut lane, now)?;
            Normalizer::check_dense(&lane)?;
            Ok(snapshot)
        })?;

        tracing::debug!(container, item = id, "item deleted");
        self.audit.publish(AuditEvent::new(
            container,
            AuditAction::ItemDeleted,
            TargetType::Item,
            id,
            with_ids(container, id, json!({ "before": snapshot.to_json() })),
        ));
        Ok(())
    }

    pub(crate) fn reorder_in(
        &mut self,
        scope: Scope,
        ordered_ids: &[ItemId],
        now: Timestamp,
    ) -> Result<Vec<Item>> {
        if ordered_ids.is_empty() {
            return Err(Error::InvalidRequest("item ids must not be empty".into()));
        }
        let mut seen = HashSet::with_capacity(ordered_ids.len());
        if let Some(duplicate) = ordered_ids.iter().find(|id| !seen.insert(id.as_str())) {
            return Err(Error::InvalidRequest(format!(
                "duplicate item id: {duplicate}"
            )));
        }

        let (before_ids, ordered) = self.store.transaction(|store| {
            let mut lane = scope.load(store)?;
            Normalizer::normalize(store, &mut lane, now)?;

            if ordered_ids.len() != lane.len() {
                return Err(Error::InvalidRequest(format!(
                    "must include all items: expected {}, got {}",
                    lane.len(),
                    ordered_ids.len()
                )));
            }

            let before_ids: Vec<ItemId> = lane.iter().map(|item| item.id.clone()).collect();
            let mut by_id: HashMap<ItemId, Item> = lane
                .into_iter()
                .map(|item| (item.id.clone(), item))
                .collect();

            let unknown: Vec<&str> = ordered_ids
                .iter()
                .map(String::as_str)
                .filter(|id| !by_id.contains_key(*id))
                .collect();
            if !unknown.is_empty() {
                return Err(Error::InvalidRequest(format!(
                    "invalid item id(s): {}",
                    unknown.join(", ")
                )));
            }

            let mut ordered: Vec<Item> = ordered_ids
                .iter()
                .filter_map(|id| by_id.remove(id))
                .collect();
            Normalizer::normalize(store, &mut ordered, now)?;
            Normalizer::check_dense(&ordered)?;
            Ok((before_ids, ordered))
        })?;

        let after_ids: Vec<&ItemId> = ordered.iter().map(|item| &item.id).collect();
        if before_ids.iter().eq(after_ids.iter().copied()) {
            tracing::debug!(container = %scope.container, "reorder matches current order");
            return Ok(ordered);
        }

        tracing::debug!(container = %scope.container, items = ordered.len(), "items reordered");
        let mut metadata = json!({
            "containerId": scope.container,
            "beforeOrderedIds": before_ids,
            "afterOrderedIds": after_ids,
        });
        if let Some(group) = &scope.group {
            metadata["groupKey"] = json!(group);
        }
        self.audit.publish(AuditEvent::new(
            scope.container.clone(),
            AuditAction::ItemsReordered,
            TargetType::Container,
            scope.container.clone(),
            metadata,
        ));
        Ok(ordered)
    }
}

/// Prefix a payload object with the container and item ids.
pub(crate) fn with_ids(container: &str, item: &str, payload: Value) -> Value {
    let mut metadata = json!({ "containerId": container, "itemId": item });
    if let (Value::Object(target), Value::Object(source)) = (&mut metadata, payload) {
        target.extend(source);
    }
    metadata
}
