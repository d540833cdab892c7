//! # Taskline Engine
//!
//! Ordered task items with change-tracked audit events.
//!
//! Task items inside a container (a card) carry an explicit position,
//! `sort_order`, that stays a dense, zero-based, gap-free permutation under
//! insert, move, delete and bulk reorder. The grouped variant keeps positions
//! dense independently per `(container, group)`; ungrouped items form their
//! own lane beside the groups.
//!
//! ## Design Principles
//!
//! - **No IO**: the engine talks to an [`OrderStore`] and an [`AuditEmitter`]
//!   and knows nothing about databases or transports
//! - **Deterministic**: timestamps are passed in, ids come from the store
//! - **Repair, then mutate**: stored positions are renormalized before moves
//!   and reorders instead of being trusted
//! - **Silent no-ops**: every mutation is diffed against a snapshot, and an
//!   audit event is published only for a real change
//!
//! ## Operations
//!
//! [`OrderedListEngine`] (the container's ungrouped items):
//! - `create` - insert at a clamped position, tail by default
//! - `update` - content, done flag and move, diffed into one event
//! - `delete` - tombstone, then close the gap
//! - `reorder` - full permutation replacement, validated for completeness
//!
//! [`GroupedOrderedListEngine`] (per group) offers the same operations plus
//! `reassign_group`, which appends the item at the destination group's tail.
//!
//! ## Quick Start
//!
//! ```rust
//! use taskline_engine::{AuditLog, ItemChanges, MemoryStore, NewItem, OrderedListEngine};
//!
//! let mut engine = OrderedListEngine::new(MemoryStore::new(), AuditLog::new());
//!
//! let a = engine.create("card-1", NewItem::new("Design"), 1000).unwrap();
//! let b = engine.create("card-1", NewItem::new("Build"), 1000).unwrap();
//!
//! // Move "Build" to the front
//! engine
//!     .update("card-1", &b.id, ItemChanges::new().position(0), 2000)
//!     .unwrap();
//!
//! let items = engine.list("card-1").unwrap();
//! assert_eq!(items[0].id, b.id);
//! assert_eq!(items[1].id, a.id);
//! assert_eq!(engine.audit().len(), 3);
//! ```

pub mod audit;
pub mod engine;
pub mod error;
pub mod grouped;
pub mod item;
pub mod normalize;
pub mod store;
pub mod tracker;

// Re-export main types at crate root
pub use audit::{AuditAction, AuditEmitter, AuditEvent, AuditLog, NoopEmitter, TargetType};
pub use engine::OrderedListEngine;
pub use error::{Error, Result};
pub use grouped::GroupedOrderedListEngine;
pub use item::{GroupKey, Item, ItemChanges, NewItem};
pub use normalize::Normalizer;
pub use store::{MemoryStore, OrderStore};
pub use tracker::{ChangeSet, ChangeTracker, Field, FieldChange, Snapshot, Tracked};

/// Type aliases for clarity
pub type ItemId = String;
pub type ContainerId = String;
pub type Position = u32;
pub type Timestamp = u64;
