//! Audit log operations

use sqlx::{PgConnection, PgPool};
use taskline_engine::AuditEvent;

/// A stored audit entry, newest first when listed.
#[derive(Debug, sqlx::FromRow, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub id: i64,
    pub action: String,
    pub target_type: String,
    pub target_id: String,
    pub metadata: serde_json::Value,
    pub actor: String,
    pub created_at: i64,
}

/// Write one audit event within the unit of work that produced it.
pub async fn insert_audit_event(
    conn: &mut PgConnection,
    event: &AuditEvent,
    actor: &str,
    now: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO audit_events (container_id, action, target_type, target_id, metadata, actor, created_at) VALUES ($1, $2, $3, $4, $5, $6, $7)"
    )
    .bind(&event.container_id)
    .bind(event.action.as_str())
    .bind(event.target_type.as_str())
    .bind(&event.target_id)
    .bind(&event.metadata)
    .bind(actor)
    .bind(now)
    .execute(conn)
    .await?;
    Ok(())
}

/// Query audit entries for a container (paginated)
pub async fn list_audit_events(
    pool: &PgPool,
    container_id: &str,
    limit: i64,
    offset: i64,
) -> Result<Vec<AuditEntry>, sqlx::Error> {
    sqlx::query_as(
        "SELECT id, action, target_type, target_id, metadata, actor, created_at FROM audit_events WHERE container_id = $1 ORDER BY id DESC LIMIT $2 OFFSET $3"
    )
    .bind(container_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}
