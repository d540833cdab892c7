//! Audit events and the emitter seam.

use crate::ContainerId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Kind of change recorded by an audit event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    ItemCreated,
    ItemUpdated,
    ItemDeleted,
    ItemsReordered,
    GroupChanged,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::ItemCreated => "ITEM_CREATED",
            AuditAction::ItemUpdated => "ITEM_UPDATED",
            AuditAction::ItemDeleted => "ITEM_DELETED",
            AuditAction::ItemsReordered => "ITEMS_REORDERED",
            AuditAction::GroupChanged => "GROUP_CHANGED",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What an event's `target_id` refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetType {
    Item,
    Container,
}

impl TargetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetType::Item => "item",
            TargetType::Container => "container",
        }
    }
}

/// A structured record of one logical change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
    pub container_id: ContainerId,
    pub action: AuditAction,
    pub target_type: TargetType,
    pub target_id: String,
    /// Action-specific payload (snapshot, before/after diff, id sequences)
    pub metadata: Value,
}

impl AuditEvent {
    pub fn new(
        container_id: impl Into<ContainerId>,
        action: AuditAction,
        target_type: TargetType,
        target_id: impl Into<String>,
        metadata: Value,
    ) -> Self {
        Self {
            container_id: container_id.into(),
            action,
            target_type,
            target_id: target_id.into(),
            metadata,
        }
    }
}

/// Receiver of audit events.
///
/// The engine publishes at most once per mutating call, and only when a
/// real change happened.
pub trait AuditEmitter {
    fn publish(&mut self, event: AuditEvent);
}

/// Emitter that keeps events in memory, in publish order.
#[derive(Debug, Clone, Default)]
pub struct AuditLog {
    events: Vec<AuditEvent>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[AuditEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn last(&self) -> Option<&AuditEvent> {
        self.events.last()
    }

    /// Remove and return all collected events.
    pub fn drain(&mut self) -> Vec<AuditEvent> {
        std::mem::take(&mut self.events)
    }
}

impl AuditEmitter for AuditLog {
    fn publish(&mut self, event: AuditEvent) {
        self.events.push(event);
    }
}

/// Emitter that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEmitter;

impl AuditEmitter for NoopEmitter {
    fn publish(&mut self, _event: AuditEvent) {}
}
