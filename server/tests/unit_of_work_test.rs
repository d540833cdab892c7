//! Tests for the unit-of-work flow the server runs per request.
//!
//! The server loads a container's active rows into a `MemoryStore`, runs one
//! engine operation, and flushes the dirty items plus the collected audit
//! events. These tests drive the same flow in memory, so no database is
//! required.

use serde_json::json;
use taskline_engine::{
    AuditAction, AuditEvent, AuditLog, Error, GroupKey, GroupedOrderedListEngine, Item,
    ItemChanges, MemoryStore, NewItem,
};
use uuid::Uuid;

type Workspace = GroupedOrderedListEngine<MemoryStore, AuditLog>;

/// Rows as the database would hand them back for one container.
fn stored_rows() -> Vec<Item> {
    vec![
        Item::new("a", "card-1", "Design", 0, 1000),
        Item::new("b", "card-1", "Build", 1, 1000),
        Item::new("c", "card-1", "Ship", 2, 1000),
    ]
}

fn load(rows: Vec<Item>) -> Workspace {
    let store = MemoryStore::from_items(rows).with_id_source(|| Uuid::new_v4().to_string());
    GroupedOrderedListEngine::new(store, AuditLog::new())
}

/// What the server would write back: dirty rows and audit events.
fn flush(workspace: Workspace) -> (Vec<Item>, Vec<AuditEvent>) {
    let (mut store, mut audit) = workspace.into_parts();
    (store.take_dirty(), audit.drain())
}

#[cfg(test)]
mod flush_tests {
    use super::*;

    #[test]
    fn create_writes_new_row_and_one_event() {
        let mut workspace = load(stored_rows());
        let item = workspace
            .ungrouped()
            .create("card-1", NewItem::new("Plan").at(0), 2000)
            .unwrap();
        assert!(Uuid::parse_str(&item.id).is_ok());

        let (written, events) = flush(workspace);

        // new row plus the three shifted siblings
        assert_eq!(written.len(), 4);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].action, AuditAction::ItemCreated);
        assert_eq!(events[0].metadata["sortOrder"], json!(0));
    }

    #[test]
    fn noop_update_writes_nothing() {
        let mut workspace = load(stored_rows());
        workspace
            .ungrouped()
            .update(
                "card-1",
                "b",
                ItemChanges::new().content("Build").position(1),
                2000,
            )
            .unwrap();

        let (written, events) = flush(workspace);
        assert!(written.is_empty());
        assert!(events.is_empty());
    }

    #[test]
    fn move_writes_only_shifted_rows() {
        let mut workspace = load(stored_rows());
        workspace
            .ungrouped()
            .update("card-1", "c", ItemChanges::new().position(1), 2000)
            .unwrap();

        let (written, events) = flush(workspace);
        let ids: Vec<_> = written.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);
        assert_eq!(events[0].action, AuditAction::ItemUpdated);
        assert_eq!(events[0].metadata["itemId"], json!("c"));
    }

    #[test]
    fn failed_operation_leaves_nothing_to_flush() {
        let mut workspace = load(stored_rows());
        let err = workspace
            .ungrouped()
            .reorder("card-1", &["a".to_string(), "b".to_string()], 2000)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));

        let (written, events) = flush(workspace);
        assert!(written.is_empty());
        assert!(events.is_empty());
    }

    #[test]
    fn drifted_rows_are_repaired_on_write() {
        let rows = vec![
            Item::new("a", "card-1", "Design", 3, 1000),
            Item::new("b", "card-1", "Build", 7, 1000),
        ];
        let mut workspace = load(rows);
        workspace.ungrouped().delete("card-1", "a", 2000).unwrap();

        let (written, _) = flush(workspace);
        let b = written.iter().find(|i| i.id == "b").unwrap();
        assert_eq!(b.sort_order, 0);
        let a = written.iter().find(|i| i.id == "a").unwrap();
        assert_eq!(a.deleted_at, Some(2000));
    }
}

#[cfg(test)]
mod grouped_flow_tests {
    use super::*;

    fn grouped_rows() -> Vec<Item> {
        vec![
            Item::new("b0", "card-1", "B0", 0, 1000).in_group(GroupKey::new("BACKEND")),
            Item::new("b1", "card-1", "B1", 1, 1000).in_group(GroupKey::new("BACKEND")),
            Item::new("f0", "card-1", "F0", 0, 1000).in_group(GroupKey::new("FRONTEND")),
        ]
    }

    #[test]
    fn reassign_writes_moved_and_source_rows() {
        let mut workspace = load(grouped_rows());
        let moved = workspace
            .reassign_group("card-1", "b0", GroupKey::new("FRONTEND"), 2000)
            .unwrap();
        assert_eq!(moved.sort_order, 1);

        let (written, events) = flush(workspace);
        let mut ids: Vec<_> = written.iter().map(|i| i.id.clone()).collect();
        ids.sort();
        assert_eq!(ids, vec!["b0", "b1"]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].action, AuditAction::GroupChanged);
    }

    #[test]
    fn group_reorder_event_lists_both_orders() {
        let mut workspace = load(grouped_rows());
        workspace
            .reorder(
                "card-1",
                GroupKey::new("BACKEND"),
                &["b1".to_string(), "b0".to_string()],
                2000,
            )
            .unwrap();

        let (_, events) = flush(workspace);
        assert_eq!(events[0].action, AuditAction::ItemsReordered);
        assert_eq!(events[0].metadata["beforeOrderedIds"], json!(["b0", "b1"]));
        assert_eq!(events[0].metadata["afterOrderedIds"], json!(["b1", "b0"]));
    }
}

#[cfg(test)]
mod wire_format_tests {
    use super::*;

    #[test]
    fn item_serializes_camel_case() {
        let item = Item::new("a", "card-1", "Design", 0, 1000).in_group(GroupKey::new("QA"));
        let json = serde_json::to_value(&item).unwrap();

        assert_eq!(json["containerId"], json!("card-1"));
        assert_eq!(json["sortOrder"], json!(0));
        assert_eq!(json["isDone"], json!(false));
        assert_eq!(json["groupKey"], json!({"lane": "QA"}));
    }

    #[test]
    fn changes_deserialize_from_patch_body() {
        let changes: ItemChanges =
            serde_json::from_value(json!({"isDone": true, "position": -1})).unwrap();
        assert_eq!(changes, ItemChanges::new().done(true).position(-1));
    }

    #[test]
    fn audit_action_wire_names() {
        let json = serde_json::to_value(AuditAction::GroupChanged).unwrap();
        assert_eq!(json, json!("GROUP_CHANGED"));
    }
}

#[cfg(test)]
mod mixed_container_tests {
    use super::*;
    use taskline_engine::Position;

    fn mixed_rows() -> Vec<Item> {
        vec![
            Item::new("q0", "card-1", "Q0", 0, 1000).in_group(GroupKey::new("QA")),
            Item::new("q1", "card-1", "Q1", 1, 1000).in_group(GroupKey::new("QA")),
            Item::new("f0", "card-1", "F0", 0, 1000).in_group(GroupKey::new("FRONTEND")),
            Item::new("u0", "card-1", "U0", 0, 1000),
            Item::new("u1", "card-1", "U1", 1, 1000),
        ]
    }

    fn group_positions(workspace: &Workspace, lane: &str) -> Vec<Position> {
        workspace
            .list("card-1", &GroupKey::new(lane))
            .unwrap()
            .iter()
            .map(|i| i.sort_order)
            .collect()
    }

    fn assert_groups_dense(workspace: &Workspace) {
        assert_eq!(group_positions(workspace, "QA"), vec![0, 1]);
        assert_eq!(group_positions(workspace, "FRONTEND"), vec![0]);
    }

    #[test]
    fn ungrouped_create_keeps_groups_dense() {
        let mut workspace = load(mixed_rows());
        let item = workspace
            .ungrouped()
            .create("card-1", NewItem::new("U2").at(0), 2000)
            .unwrap();

        assert_eq!(item.sort_order, 0);
        assert_groups_dense(&workspace);

        let (written, _) = flush(workspace);
        assert!(written.iter().all(|i| i.group_key.is_none()));
    }

    #[test]
    fn ungrouped_reorder_lists_only_ungrouped_ids() {
        let mut workspace = load(mixed_rows());
        let ordered = workspace
            .ungrouped()
            .reorder("card-1", &["u1".to_string(), "u0".to_string()], 2000)
            .unwrap();

        let ids: Vec<_> = ordered.iter().map(|i| (i.id.as_str(), i.sort_order)).collect();
        assert_eq!(ids, vec![("u1", 0), ("u0", 1)]);
        assert_groups_dense(&workspace);

        let (written, events) = flush(workspace);
        assert!(written.iter().all(|i| i.group_key.is_none()));
        assert_eq!(events[0].metadata["afterOrderedIds"], json!(["u1", "u0"]));
    }

    #[test]
    fn ungrouped_move_and_delete_keep_groups_dense() {
        let mut workspace = load(mixed_rows());
        workspace
            .ungrouped()
            .update("card-1", "u0", ItemChanges::new().position(5), 2000)
            .unwrap();
        workspace.ungrouped().delete("card-1", "u1", 2000).unwrap();

        assert_groups_dense(&workspace);
        let lane = workspace.ungrouped().list("card-1").unwrap();
        assert_eq!(lane.len(), 1);
        assert_eq!(lane[0].sort_order, 0);
    }

    #[test]
    fn ungrouped_item_can_join_a_group() {
        let mut workspace = load(mixed_rows());
        let moved = workspace
            .reassign_group("card-1", "u0", GroupKey::new("FRONTEND"), 2000)
            .unwrap();

        assert_eq!(moved.sort_order, 1);
        assert_eq!(group_positions(&workspace, "FRONTEND"), vec![0, 1]);
        let lane = workspace.ungrouped().list("card-1").unwrap();
        assert_eq!((lane[0].id.as_str(), lane[0].sort_order), ("u1", 0));
    }
}
