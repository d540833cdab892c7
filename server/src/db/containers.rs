//! Database operations for the containers table.

use serde::Serialize;
use sqlx::{PgConnection, PgPool};

/// A stored container row.
#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StoredContainer {
    pub id: String,
    pub created_at: i64,
}

/// Insert a container. Returns `None` when the id is already taken.
pub async fn create_container(
    pool: &PgPool,
    id: &str,
    now: i64,
) -> Result<Option<StoredContainer>, sqlx::Error> {
    sqlx::query_as::<_, StoredContainer>(
        r#"
        INSERT INTO containers (id, created_at)
        VALUES ($1, $2)
        ON CONFLICT (id) DO NOTHING
        RETURNING id, created_at
        "#,
    )
    .bind(id)
    .bind(now)
    .fetch_optional(pool)
    .await
}

/// Whether a container exists.
pub async fn container_exists(conn: &mut PgConnection, id: &str) -> Result<bool, sqlx::Error> {
    let row: Option<(String,)> = sqlx::query_as("SELECT id FROM containers WHERE id = $1")
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(row.is_some())
}

/// Take the container's row lock for the rest of the transaction.
///
/// Every mutation of a container's items holds this lock, so mutations of
/// one container run one at a time while other containers proceed. Returns
/// `false` when the container does not exist.
pub async fn lock_container(conn: &mut PgConnection, id: &str) -> Result<bool, sqlx::Error> {
    let row: Option<(String,)> =
        sqlx::query_as("SELECT id FROM containers WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(conn)
            .await?;
    Ok(row.is_some())
}
