//! Store - the persistence seam and its in-memory implementation.
//!
//! The engine only talks to an [`OrderStore`]. [`MemoryStore`] is the
//! complete in-process implementation; hosts backed by a database can load a
//! container into a `MemoryStore`, run the engine, and flush
//! [`MemoryStore::take_dirty`] inside their own transaction.

use crate::{error::Result, Error, GroupKey, Item, ItemId, Timestamp};
use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// Persistence capability the engine depends on.
pub trait OrderStore {
    /// Allocate a fresh, never-reused item id.
    fn next_id(&mut self) -> ItemId;

    /// Active items of one ordering scope: the group `group`, or the
    /// container's ungrouped items when `None`. Ordered by stored
    /// `sort_order` (ties broken by `created_at`, then id).
    fn load_active(&self, container: &str, group: Option<&GroupKey>) -> Result<Vec<Item>>;

    /// One item of a container, including tombstoned ones.
    fn load_one(&self, container: &str, id: &str) -> Result<Option<Item>>;

    /// Insert or replace an item.
    fn persist(&mut self, item: &Item) -> Result<()>;

    fn persist_all(&mut self, items: &[Item]) -> Result<()> {
        for item in items {
            self.persist(item)?;
        }
        Ok(())
    }

    /// Set the tombstone of an item.
    fn tombstone(&mut self, id: &str, timestamp: Timestamp) -> Result<()>;

    /// Run `f` as one unit of work. When `f` fails, none of its writes may
    /// remain visible.
    ///
    /// The default runs `f` directly and suits stores that are already
    /// wrapped in an outer transaction.
    fn transaction<T, F>(&mut self, f: F) -> Result<T>
    where
        Self: Sized,
        F: FnOnce(&mut Self) -> Result<T>,
    {
        f(self)
    }
}

type IdSource = Box<dyn FnMut() -> ItemId + Send>;

/// In-memory [`OrderStore`] with rollback-on-error transactions and dirty
/// tracking.
#[derive(Default)]
pub struct MemoryStore {
    items: HashMap<ItemId, Item>,
    dirty: BTreeSet<ItemId>,
    sequence: u64,
    id_source: Option<IdSource>,
}

impl MemoryStore {
    /// Create an empty store with sequential `item-N` ids.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-loaded with existing items. Loaded items are not
    /// dirty.
    pub fn from_items(items: impl IntoIterator<Item = Item>) -> Self {
        let mut store = Self::new();
        for item in items {
            store.items.insert(item.id.clone(), item);
        }
        store.sequence = store.items.len() as u64;
        store
    }

    /// Use `source` to allocate ids instead of the built-in sequence.
    pub fn with_id_source(mut self, source: impl FnMut() -> ItemId + Send + 'static) -> Self {
        self.id_source = Some(Box::new(source));
        self
    }

    /// Get an item by id, including tombstoned ones.
    pub fn get(&self, id: &str) -> Option<&Item> {
        self.items.get(id)
    }

    /// All items including tombstoned, in no particular order.
    pub fn all_items(&self) -> impl Iterator<Item = &Item> {
        self.items.values()
    }

    /// Count of items including tombstoned.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether any write happened since the last [`take_dirty`](Self::take_dirty).
    pub fn has_changes(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Remove and return the items written since the last call, by id.
    pub fn take_dirty(&mut self) -> Vec<Item> {
        std::mem::take(&mut self.dirty)
            .into_iter()
            .filter_map(|id| self.items.get(&id).cloned())
            .collect()
    }
}

impl fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryStore")
            .field("items", &self.items.len())
            .field("dirty", &self.dirty.len())
            .field("sequence", &self.sequence)
            .finish()
    }
}

impl OrderStore for MemoryStore {
    fn next_id(&mut self) -> ItemId {
        if let Some(source) = self.id_source.as_mut() {
            return source();
        }
        loop {
            self.sequence += 1;
            let id = format!("item-{}", self.sequence);
            if !self.items.contains_key(&id) {
                return id;
            }
        }
    }

    fn load_active(&self, container: &str, group: Option<&GroupKey>) -> Result<Vec<Item>> {
        let mut items: Vec<Item> = self
            .items
            .values()
            .filter(|item| item.is_active() && item.in_scope(container, group))
            .cloned()
            .collect();
        items.sort_by(|a, b| {
            a.sort_order
                .cmp(&b.sort_order)
                .then(a.created_at.cmp(&b.created_at))
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(items)
    }

    fn load_one(&self, container: &str, id: &str) -> Result<Option<Item>> {
        Ok(self
            .items
            .get(id)
            .filter(|item| item.container_id == container)
            .cloned())
    }

    fn persist(&mut self, item: &Item) -> Result<()> {
        self.items.insert(item.id.clone(), item.clone());
        self.dirty.insert(item.id.clone());
        Ok(())
    }

    fn tombstone(&mut self, id: &str, timestamp: Timestamp) -> Result<()> {
        let item = self
            .items
            .get_mut(id)
            .ok_or_else(|| Error::NotFound(format!("item {id}")))?;
        item.mark_deleted(timestamp);
        self.dirty.insert(id.to_string());
        Ok(())
    }

    fn transaction<T, F>(&mut self, f: F) -> Result<T>
    where
        Self: Sized,
        F: FnOnce(&mut Self) -> Result<T>,
    {
        let items = self.items.clone();
        let dirty = self.dirty.clone();
        let sequence = self.sequence;

        let result = f(self);
        if result.is_err() {
            self.items = items;
            self.dirty = dirty;
            self.sequence = sequence;
        }
        result
    }
}
