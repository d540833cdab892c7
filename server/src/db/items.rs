//! Database operations for the items table.

use sqlx::{PgConnection, Row};
use taskline_engine::{GroupKey, Item, Position, Timestamp};

/// A stored item row from the database.
#[derive(Debug)]
pub struct StoredItem {
    pub id: String,
    pub container_id: String,
    pub content: String,
    pub is_done: bool,
    pub done_at: Option<i64>,
    pub sort_order: i64,
    pub group_lane: Option<String>,
    pub group_qualifier: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
    pub deleted_at: Option<i64>,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for StoredItem {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(StoredItem {
            id: row.try_get("id")?,
            container_id: row.try_get("container_id")?,
            content: row.try_get("content")?,
            is_done: row.try_get("is_done")?,
            done_at: row.try_get("done_at")?,
            sort_order: row.try_get("sort_order")?,
            group_lane: row.try_get("group_lane")?,
            group_qualifier: row.try_get("group_qualifier")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            deleted_at: row.try_get("deleted_at")?,
        })
    }
}

impl StoredItem {
    /// Convert database row to an engine item.
    ///
    /// Negative positions left behind by other writers clamp to zero; the
    /// engine renumbers the scope before it trusts them.
    pub fn to_item(&self) -> Item {
        let group_key = self.group_lane.as_ref().map(|lane| GroupKey {
            lane: lane.clone(),
            qualifier: self.group_qualifier.clone(),
        });

        Item {
            id: self.id.clone(),
            container_id: self.container_id.clone(),
            content: self.content.clone(),
            is_done: self.is_done,
            done_at: self.done_at.map(|t| t as Timestamp),
            sort_order: self.sort_order.clamp(0, Position::MAX as i64) as Position,
            group_key: group_key.map(GroupKey::normalized),
            created_at: self.created_at as Timestamp,
            updated_at: self.updated_at as Timestamp,
            deleted_at: self.deleted_at.map(|t| t as Timestamp),
        }
    }
}

/// Get the active (non-deleted) items of a container.
pub async fn load_active_items(
    conn: &mut PgConnection,
    container_id: &str,
) -> Result<Vec<StoredItem>, sqlx::Error> {
    sqlx::query_as::<_, StoredItem>(
        r#"
        SELECT id, container_id, content, is_done, done_at, sort_order,
               group_lane, group_qualifier, created_at, updated_at, deleted_at
        FROM items
        WHERE container_id = $1 AND deleted_at IS NULL
        ORDER BY sort_order, created_at, id
        "#,
    )
    .bind(container_id)
    .fetch_all(conn)
    .await
}

/// Upsert an item (insert or update).
pub async fn upsert_item(conn: &mut PgConnection, item: &Item) -> Result<(), sqlx::Error> {
    let (lane, qualifier) = match &item.group_key {
        Some(group) => (Some(group.lane.as_str()), group.qualifier.as_deref()),
        None => (None, None),
    };

    sqlx::query(
        r#"
        INSERT INTO items (
            id, container_id, content, is_done, done_at, sort_order,
            group_lane, group_qualifier, created_at, updated_at, deleted_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        ON CONFLICT (id) DO UPDATE SET
            content = EXCLUDED.content,
            is_done = EXCLUDED.is_done,
            done_at = EXCLUDED.done_at,
            sort_order = EXCLUDED.sort_order,
            group_lane = EXCLUDED.group_lane,
            group_qualifier = EXCLUDED.group_qualifier,
            updated_at = EXCLUDED.updated_at,
            deleted_at = EXCLUDED.deleted_at
        "#,
    )
    .bind(&item.id)
    .bind(&item.container_id)
    .bind(&item.content)
    .bind(item.is_done)
    .bind(item.done_at.map(|t| t as i64))
    .bind(item.sort_order as i64)
    .bind(lane)
    .bind(qualifier)
    .bind(item.created_at as i64)
    .bind(item.updated_at as i64)
    .bind(item.deleted_at.map(|t| t as i64))
    .execute(conn)
    .await?;

    Ok(())
}
