//! Item types: the ordered task entries and their field sets.

use crate::{ContainerId, ItemId, Position, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification that scopes ordering to a sub-lane of a container.
///
/// Two keys are equal when both the lane and the qualifier match. A blank
/// qualifier is stored as `None`, so "missing" and "empty" compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupKey {
    /// Role or field lane, e.g. `BACKEND`
    pub lane: String,
    /// Optional free-text qualifier within the lane
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualifier: Option<String>,
}

impl GroupKey {
    /// Create a key for a lane with no qualifier.
    pub fn new(lane: impl Into<String>) -> Self {
        Self {
            lane: lane.into(),
            qualifier: None,
        }
    }

    /// Create a key for a lane with a qualifier.
    pub fn with_qualifier(lane: impl Into<String>, qualifier: impl Into<String>) -> Self {
        Self {
            lane: lane.into(),
            qualifier: Some(qualifier.into()),
        }
        .normalized()
    }

    /// Trim the qualifier and drop it when blank.
    pub fn normalized(mut self) -> Self {
        self.qualifier = self
            .qualifier
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty());
        self
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.qualifier {
            Some(q) => write!(f, "{}:{}", self.lane, q),
            None => write!(f, "{}", self.lane),
        }
    }
}

/// A task item inside a container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    /// Unique identifier, never reused
    pub id: ItemId,
    /// Owning container
    pub container_id: ContainerId,
    /// Non-blank text
    pub content: String,
    pub is_done: bool,
    /// When `is_done` last went from false to true
    pub done_at: Option<Timestamp>,
    /// Dense zero-based position within the item's ordering scope
    pub sort_order: Position,
    /// Ordering scope for the grouped variant
    pub group_key: Option<GroupKey>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    /// Tombstone
    pub deleted_at: Option<Timestamp>,
}

impl Item {
    /// Create a new active item.
    pub fn new(
        id: impl Into<ItemId>,
        container_id: impl Into<ContainerId>,
        content: impl Into<String>,
        sort_order: Position,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            id: id.into(),
            container_id: container_id.into(),
            content: content.into(),
            is_done: false,
            done_at: None,
            sort_order,
            group_key: None,
            created_at: timestamp,
            updated_at: timestamp,
            deleted_at: None,
        }
    }

    /// Place the item in a group.
    pub fn in_group(mut self, group: GroupKey) -> Self {
        self.group_key = Some(group);
        self
    }

    /// Check if the item is active (not tombstoned).
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }

    /// Check if the item belongs to `container` and to `group` exactly:
    /// `None` selects the container's ungrouped lane.
    pub fn in_scope(&self, container: &str, group: Option<&GroupKey>) -> bool {
        self.container_id == container && self.group_key.as_ref() == group
    }

    /// Set the done flag, recording `done_at` on false -> true and clearing
    /// it on true -> false. Returns whether the flag changed.
    pub fn set_done(&mut self, done: bool, timestamp: Timestamp) -> bool {
        if self.is_done == done {
            return false;
        }
        self.is_done = done;
        self.done_at = done.then_some(timestamp);
        true
    }

    /// Mark the item as deleted (tombstone).
    pub fn mark_deleted(&mut self, timestamp: Timestamp) {
        self.deleted_at = Some(timestamp);
        self.updated_at = timestamp;
    }
}

/// Fields for a new item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewItem {
    pub content: String,
    #[serde(default)]
    pub is_done: Option<bool>,
    /// Requested position; clamped into `[0, count]`, tail when absent
    #[serde(default)]
    pub position: Option<i64>,
}

impl NewItem {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn done(mut self, done: bool) -> Self {
        self.is_done = Some(done);
        self
    }

    pub fn at(mut self, position: i64) -> Self {
        self.position = Some(position);
        self
    }
}

/// Optional changes for an update. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemChanges {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub is_done: Option<bool>,
    /// Target index; clamped into `[0, n-1]`
    #[serde(default)]
    pub position: Option<i64>,
}

impl ItemChanges {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn done(mut self, done: bool) -> Self {
        self.is_done = Some(done);
        self
    }

    pub fn position(mut self, position: i64) -> Self {
        self.position = Some(position);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_none() && self.is_done.is_none() && self.position.is_none()
    }
}

/// Trim content and reject it when blank.
pub(crate) fn checked_content(content: &str) -> crate::Result<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(crate::Error::InvalidContent(
            "content must not be blank".into(),
        ));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_item() {
        let item = Item::new("item-1", "card-1", "Write tests", 0, 1000);

        assert_eq!(item.id, "item-1");
        assert_eq!(item.container_id, "card-1");
        assert_eq!(item.sort_order, 0);
        assert!(!item.is_done);
        assert!(item.is_active());
        assert_eq!(item.group_key, None);
    }

    #[test]
    fn done_transitions() {
        let mut item = Item::new("item-1", "card-1", "Ship it", 0, 1000);

        assert!(item.set_done(true, 2000));
        assert_eq!(item.done_at, Some(2000));

        assert!(!item.set_done(true, 3000));
        assert_eq!(item.done_at, Some(2000));

        assert!(item.set_done(false, 4000));
        assert_eq!(item.done_at, None);
    }

    #[test]
    fn delete_item() {
        let mut item = Item::new("item-1", "card-1", "Ship it", 0, 1000);
        item.mark_deleted(2000);

        assert!(!item.is_active());
        assert_eq!(item.deleted_at, Some(2000));
    }

    #[test]
    fn blank_qualifier_equals_missing() {
        assert_eq!(
            GroupKey::with_qualifier("BACKEND", "   "),
            GroupKey::new("BACKEND")
        );
        assert_ne!(
            GroupKey::with_qualifier("BACKEND", "api"),
            GroupKey::new("BACKEND")
        );
        assert_eq!(GroupKey::with_qualifier("BACKEND", " api ").to_string(), "BACKEND:api");
    }

    #[test]
    fn scope_membership() {
        let item = Item::new("item-1", "card-1", "x", 0, 1000).in_group(GroupKey::new("QA"));

        assert!(!item.in_scope("card-1", None));
        assert!(item.in_scope("card-1", Some(&GroupKey::new("QA"))));
        assert!(!item.in_scope("card-1", Some(&GroupKey::new("DESIGN"))));
        assert!(!item.in_scope("card-2", Some(&GroupKey::new("QA"))));

        let loose = Item::new("item-2", "card-1", "y", 0, 1000);
        assert!(loose.in_scope("card-1", None));
        assert!(!loose.in_scope("card-1", Some(&GroupKey::new("QA"))));
    }

    #[test]
    fn content_validation() {
        assert_eq!(checked_content("  hello ").unwrap(), "hello");
        assert!(matches!(
            checked_content(" \t\n"),
            Err(crate::Error::InvalidContent(_))
        ));
    }

    #[test]
    fn serialization_format() {
        let item = Item::new("item-1", "card-1", "x", 3, 1000);
        let json = serde_json::to_string(&item).unwrap();
        assert!(json.contains("sortOrder"));
        assert!(json.contains("containerId"));
        assert!(json.contains("isDone"));
    }
}
