//! Audit log handler

use crate::db::{self, AuditEntry};
use crate::error::{AppError, Result};
use serde::Deserialize;
use sqlx::PgPool;

/// Default page size for audit listings.
const DEFAULT_PER_PAGE: i64 = 20;

/// Maximum page size for audit listings.
const MAX_PER_PAGE: i64 = 100;

/// Query parameters for the audit log.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl AuditQuery {
    /// `(limit, offset)` for the requested page. Pages start at 1.
    fn window(&self) -> (i64, i64) {
        let per_page = self
            .per_page
            .unwrap_or(DEFAULT_PER_PAGE)
            .clamp(1, MAX_PER_PAGE);
        let page = self.page.unwrap_or(1).max(1);
        (per_page, (page - 1).saturating_mul(per_page))
    }
}

/// List a container's audit events, newest first.
pub async fn handle_audit_log(
    pool: &PgPool,
    container_id: &str,
    query: AuditQuery,
) -> Result<Vec<AuditEntry>> {
    let mut conn = pool.acquire().await?;
    if !db::container_exists(&mut conn, container_id).await? {
        return Err(AppError::NotFound(format!("container {}", container_id)));
    }
    drop(conn);

    let (limit, offset) = query.window();
    Ok(db::list_audit_events(pool, container_id, limit, offset).await?)
}
