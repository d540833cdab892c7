//! Change tracking for mutations.
//!
//! A [`Snapshot`] captures the named fields of an entity before a mutation.
//! After the mutation, [`ChangeTracker::diff`] compares the final values and
//! yields a [`ChangeSet`] holding only the fields that differ, or `None` when
//! nothing changed. Callers diff once per logical mutation so a multi-field
//! update produces a single combined change set.

use crate::Item;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

/// A tracked field of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    Content,
    IsDone,
    SortOrder,
    GroupKey,
}

impl Field {
    /// Fields tracked by the single-lane engine.
    pub const LANE: &'static [Field] = &[Field::Content, Field::IsDone, Field::SortOrder];

    /// Fields tracked by the grouped engine.
    pub const GROUPED: &'static [Field] = &[
        Field::Content,
        Field::IsDone,
        Field::SortOrder,
        Field::GroupKey,
    ];

    /// Name used in audit metadata.
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Content => "content",
            Field::IsDone => "isDone",
            Field::SortOrder => "sortOrder",
            Field::GroupKey => "groupKey",
        }
    }
}

/// An entity whose fields can be captured by value.
pub trait Tracked {
    /// Current value of `field`. Absent optional values are `Value::Null`.
    fn field_value(&self, field: Field) -> Value;
}

impl Tracked for Item {
    fn field_value(&self, field: Field) -> Value {
        match field {
            Field::Content => json!(self.content),
            Field::IsDone => json!(self.is_done),
            Field::SortOrder => json!(self.sort_order),
            Field::GroupKey => match &self.group_key {
                Some(key) => json!(key),
                None => Value::Null,
            },
        }
    }
}

/// Immutable copy of field values at capture time.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    values: BTreeMap<Field, Value>,
}

impl Snapshot {
    /// Captured value of `field`, if it was part of the snapshot.
    pub fn get(&self, field: Field) -> Option<&Value> {
        self.values.get(&field)
    }

    /// Render as a JSON object keyed by field name.
    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = self
            .values
            .iter()
            .map(|(field, value)| (field.as_str().to_string(), value.clone()))
            .collect();
        Value::Object(map)
    }
}

/// Before/after values of one changed field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    pub before: Value,
    pub after: Value,
}

/// The fields that differ between a snapshot and the final state.
///
/// Never empty: an empty diff is reported as `None` by the tracker.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeSet {
    changes: BTreeMap<Field, FieldChange>,
}

impl ChangeSet {
    pub fn get(&self, field: Field) -> Option<&FieldChange> {
        self.changes.get(&field)
    }

    pub fn contains(&self, field: Field) -> bool {
        self.changes.contains_key(&field)
    }

    pub fn fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.changes.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Render as `{"before": {...}, "after": {...}}` over the changed fields.
    pub fn to_json(&self) -> Value {
        let mut before = Map::new();
        let mut after = Map::new();
        for (field, change) in &self.changes {
            before.insert(field.as_str().to_string(), change.before.clone());
            after.insert(field.as_str().to_string(), change.after.clone());
        }
        json!({ "before": before, "after": after })
    }
}

/// Snapshot/diff utility.
pub struct ChangeTracker;

impl ChangeTracker {
    /// Capture the named fields of `entity`.
    pub fn snapshot<T: Tracked>(entity: &T, fields: &[Field]) -> Snapshot {
        Snapshot {
            values: fields
                .iter()
                .map(|&field| (field, entity.field_value(field)))
                .collect(),
        }
    }

    /// Compare the named fields of `entity` against `snapshot`.
    ///
    /// Fields missing from the snapshot are treated as `null`, so an absent
    /// optional value and a captured `null` compare equal.
    pub fn diff<T: Tracked>(snapshot: &Snapshot, entity: &T, fields: &[Field]) -> Option<ChangeSet> {
        let changes: BTreeMap<Field, FieldChange> = fields
            .iter()
            .filter_map(|&field| {
                let before = snapshot.get(field).cloned().unwrap_or(Value::Null);
                let after = entity.field_value(field);
                (before != after).then_some((field, FieldChange { before, after }))
            })
            .collect();

        if changes.is_empty() {
            None
        } else {
            Some(ChangeSet { changes })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GroupKey;

    fn item() -> Item {
        Item::new("item-1", "card-1", "Draft", 1, 1000)
    }

    #[test]
    fn unchanged_entity_is_no_change() {
        let item = item();
        let snapshot = ChangeTracker::snapshot(&item, Field::LANE);

        assert_eq!(ChangeTracker::diff(&snapshot, &item, Field::LANE), None);
    }

    #[test]
    fn only_changed_fields_are_reported() {
        let mut item = item();
        let snapshot = ChangeTracker::snapshot(&item, Field::LANE);

        item.sort_order = 0;
        let changes = ChangeTracker::diff(&snapshot, &item, Field::LANE).unwrap();

        assert_eq!(changes.len(), 1);
        let change = changes.get(Field::SortOrder).unwrap();
        assert_eq!(change.before, json!(1));
        assert_eq!(change.after, json!(0));
        assert!(!changes.contains(Field::Content));
    }

    #[test]
    fn multi_field_changes_combine() {
        let mut item = item();
        let snapshot = ChangeTracker::snapshot(&item, Field::LANE);

        item.content = "Final".into();
        item.is_done = true;
        let changes = ChangeTracker::diff(&snapshot, &item, Field::LANE).unwrap();

        assert_eq!(
            changes.to_json(),
            json!({
                "before": {"content": "Draft", "isDone": false},
                "after": {"content": "Final", "isDone": true},
            })
        );
    }

    #[test]
    fn value_equality_not_identity() {
        let mut item = item();
        let snapshot = ChangeTracker::snapshot(&item, Field::LANE);

        item.content = String::from("Draft");
        assert_eq!(ChangeTracker::diff(&snapshot, &item, Field::LANE), None);
    }

    #[test]
    fn missing_snapshot_field_equals_null() {
        let item = item();
        let snapshot = ChangeTracker::snapshot(&item, Field::LANE);

        // groupKey was not captured and is null on the entity
        assert_eq!(ChangeTracker::diff(&snapshot, &item, &[Field::GroupKey]), None);
    }

    #[test]
    fn group_key_change() {
        let mut item = item().in_group(GroupKey::new("BACKEND"));
        let snapshot = ChangeTracker::snapshot(&item, Field::GROUPED);

        item.group_key = Some(GroupKey::with_qualifier("BACKEND", "api"));
        let changes = ChangeTracker::diff(&snapshot, &item, Field::GROUPED).unwrap();

        assert_eq!(
            changes.get(Field::GroupKey).unwrap().after,
            json!({"lane": "BACKEND", "qualifier": "api"})
        );
    }

    #[test]
    fn snapshot_json() {
        let snapshot = ChangeTracker::snapshot(&item(), Field::LANE);
        assert_eq!(
            snapshot.to_json(),
            json!({"content": "Draft", "isDone": false, "sortOrder": 1})
        );
    }
}
