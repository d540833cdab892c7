//! Container handlers.

use crate::db::{self, StoredContainer};
use crate::error::{AppError, Result};
use crate::handlers::now_millis;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

/// Request body for creating a container.
#[derive(Debug, Default, Deserialize)]
pub struct CreateContainerRequest {
    /// Caller-chosen id; a uuid is generated when absent
    #[serde(default)]
    pub id: Option<String>,
}

impl CreateContainerRequest {
    fn resolve_id(self) -> Result<String> {
        match self.id.map(|id| id.trim().to_string()) {
            Some(id) if id.is_empty() => {
                Err(AppError::BadRequest("container id must not be blank".to_string()))
            }
            Some(id) => Ok(id),
            None => Ok(Uuid::new_v4().to_string()),
        }
    }
}

/// Create an empty container.
pub async fn handle_create_container(
    pool: &PgPool,
    request: CreateContainerRequest,
) -> Result<StoredContainer> {
    let id = request.resolve_id()?;
    let now = now_millis() as i64;

    let container = db::create_container(pool, &id, now)
        .await?
        .ok_or_else(|| AppError::BadRequest(format!("container {} already exists", id)))?;

    tracing::info!(container = %container.id, "Container created");
    Ok(container)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_id_is_trimmed() {
        let request = CreateContainerRequest {
            id: Some("  card-1 ".into()),
        };
        assert_eq!(request.resolve_id().unwrap(), "card-1");
    }

    #[test]
    fn blank_id_is_rejected() {
        let request = CreateContainerRequest {
            id: Some(" ".into()),
        };
        assert!(matches!(request.resolve_id(), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn missing_id_is_generated() {
        let id = CreateContainerRequest::default().resolve_id().unwrap();
        assert!(Uuid::parse_str(&id).is_ok());
    }
}
