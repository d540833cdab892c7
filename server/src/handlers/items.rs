//! Item handlers - run engine operations against one container.
//!
//! Every mutation is one unit of work: lock the container row, load its
//! active items into a [`MemoryStore`], run the engine, then write back the
//! items it touched and the audit events it published before committing.
//! An engine error drops the transaction, so nothing from a failed
//! operation reaches the database.

use crate::db::{self, StoredItem};
use crate::error::{AppError, Result};
use serde::Deserialize;
use sqlx::PgPool;
use taskline_engine::{
    AuditLog, GroupKey, GroupedOrderedListEngine, Item, ItemChanges, ItemId, MemoryStore, NewItem,
    Timestamp,
};
use uuid::Uuid;

/// Engine a request runs against: grouped operations directly, ungrouped
/// ones through [`GroupedOrderedListEngine::ungrouped`].
pub type Workspace = GroupedOrderedListEngine<MemoryStore, AuditLog>;

/// Request body for creating an item.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateItemRequest {
    #[serde(flatten)]
    pub item: NewItem,
    /// Group to create the item in; ungrouped when absent
    #[serde(default)]
    pub group: Option<GroupKey>,
}

/// Request body for a bulk reorder.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderRequest {
    pub item_ids: Vec<ItemId>,
    /// Group whose order is replaced; the ungrouped items when absent
    #[serde(default)]
    pub group: Option<GroupKey>,
}

/// Query parameters for listing items.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub lane: Option<String>,
    pub qualifier: Option<String>,
}

impl ListQuery {
    fn group(&self) -> Option<GroupKey> {
        let lane = self.lane.as_ref()?;
        let group = match &self.qualifier {
            Some(qualifier) => GroupKey::with_qualifier(lane.clone(), qualifier.clone()),
            None => GroupKey::new(lane.clone()),
        };
        Some(group)
    }
}

/// Current wall-clock time in engine milliseconds.
pub fn now_millis() -> Timestamp {
    chrono::Utc::now().timestamp_millis().max(0) as Timestamp
}

/// Build a workspace over a container's loaded items. New items get uuid ids.
pub fn workspace(items: impl IntoIterator<Item = Item>) -> Workspace {
    let store = MemoryStore::from_items(items).with_id_source(|| Uuid::new_v4().to_string());
    GroupedOrderedListEngine::new(store, AuditLog::new())
}

fn is_grouped(workspace: &Workspace, item_id: &str) -> bool {
    workspace
        .store()
        .get(item_id)
        .is_some_and(|item| item.group_key.is_some())
}

/// Run `op` against a container's items as one unit of work.
async fn unit_of_work<T, F>(pool: &PgPool, container_id: &str, actor: &str, op: F) -> Result<T>
where
    F: FnOnce(&mut Workspace, Timestamp) -> taskline_engine::Result<T>,
{
    let mut tx = pool.begin().await?;

    if !db::lock_container(&mut tx, container_id).await? {
        return Err(AppError::NotFound(format!("container {}", container_id)));
    }

    let rows = db::load_active_items(&mut tx, container_id).await?;
    let mut workspace = workspace(rows.iter().map(StoredItem::to_item));

    let now = now_millis();
    let output = op(&mut workspace, now)?;

    let (mut store, mut audit) = workspace.into_parts();
    let written = store.take_dirty();
    for item in &written {
        db::upsert_item(&mut tx, item).await?;
    }
    let events = audit.drain();
    for event in &events {
        db::insert_audit_event(&mut tx, event, actor, now as i64).await?;
    }

    tx.commit().await?;

    tracing::debug!(
        container = container_id,
        written = written.len(),
        events = events.len(),
        actor,
        "Unit of work committed"
    );

    Ok(output)
}

/// Load a container's items for reading, without taking the lock.
async fn read_workspace(pool: &PgPool, container_id: &str) -> Result<Workspace> {
    let mut conn = pool.acquire().await?;

    if !db::container_exists(&mut conn, container_id).await? {
        return Err(AppError::NotFound(format!("container {}", container_id)));
    }

    let rows = db::load_active_items(&mut conn, container_id).await?;
    Ok(workspace(rows.iter().map(StoredItem::to_item)))
}

/// List one ordering scope in position order: the group named by `lane`
/// (and `qualifier`), or the container's ungrouped items when no lane is
/// given. Each scope has its own dense positions, so scopes are never mixed.
pub async fn handle_list(pool: &PgPool, container_id: &str, query: ListQuery) -> Result<Vec<Item>> {
    let mut workspace = read_workspace(pool, container_id).await?;
    let items = match query.group() {
        Some(group) => workspace.list(container_id, &group)?,
        None => workspace.ungrouped().list(container_id)?,
    };
    Ok(items)
}

/// Create an item, in a group when the request names one.
pub async fn handle_create(
    pool: &PgPool,
    container_id: &str,
    actor: &str,
    request: CreateItemRequest,
) -> Result<Item> {
    unit_of_work(pool, container_id, actor, |workspace, now| {
        match request.group {
            Some(group) => workspace.create(container_id, group, request.item, now),
            None => workspace.ungrouped().create(container_id, request.item, now),
        }
    })
    .await
}

/// Update content, done flag and position of an item.
pub async fn handle_update(
    pool: &PgPool,
    container_id: &str,
    item_id: &str,
    actor: &str,
    changes: ItemChanges,
) -> Result<Item> {
    unit_of_work(pool, container_id, actor, |workspace, now| {
        if is_grouped(workspace, item_id) {
            workspace.update(container_id, item_id, changes, now)
        } else {
            workspace
                .ungrouped()
                .update(container_id, item_id, changes, now)
        }
    })
    .await
}

/// Delete an item and close the gap it leaves.
pub async fn handle_delete(
    pool: &PgPool,
    container_id: &str,
    item_id: &str,
    actor: &str,
) -> Result<()> {
    unit_of_work(pool, container_id, actor, |workspace, now| {
        if is_grouped(workspace, item_id) {
            workspace.delete(container_id, item_id, now)
        } else {
            workspace.ungrouped().delete(container_id, item_id, now)
        }
    })
    .await
}

/// Replace the order of the ungrouped items, or of one group.
pub async fn handle_reorder(
    pool: &PgPool,
    container_id: &str,
    actor: &str,
    request: ReorderRequest,
) -> Result<Vec<Item>> {
    unit_of_work(pool, container_id, actor, |workspace, now| {
        match request.group {
            Some(group) => workspace.reorder(container_id, group, &request.item_ids, now),
            None => workspace
                .ungrouped()
                .reorder(container_id, &request.item_ids, now),
        }
    })
    .await
}

/// Move an item to the tail of another group.
pub async fn handle_reassign(
    pool: &PgPool,
    container_id: &str,
    item_id: &str,
    actor: &str,
    group: GroupKey,
) -> Result<Item> {
    unit_of_work(pool, container_id, actor, |workspace, now| {
        workspace.reassign_group(container_id, item_id, group, now)
    })
    .await
}
