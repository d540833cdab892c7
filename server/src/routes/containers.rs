//! Container, item and audit routes.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post, put},
    Json, Router,
};
use taskline_engine::{GroupKey, Item, ItemChanges};

use crate::auth::AuthUser;
use crate::db::{AuditEntry, StoredContainer};
use crate::error::Result;
use crate::handlers::{
    handle_audit_log, handle_create, handle_create_container, handle_delete, handle_list,
    handle_reassign, handle_reorder, handle_update, AuditQuery, CreateContainerRequest,
    CreateItemRequest, ListQuery, ReorderRequest,
};
use crate::AppState;

/// Create container routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/containers", post(create_container))
        .route("/containers/{id}/items", get(list_items).post(create_item))
        .route(
            "/containers/{id}/items/{item_id}",
            patch(update_item).delete(delete_item),
        )
        .route("/containers/{id}/items/{item_id}/group", put(reassign_group))
        .route("/containers/{id}/order", put(reorder_items))
        .route("/containers/{id}/audit", get(audit_log))
}

/// POST /containers - Create a container.
async fn create_container(
    State(state): State<AppState>,
    _auth: AuthUser,
    request: Option<Json<CreateContainerRequest>>,
) -> Result<(StatusCode, Json<StoredContainer>)> {
    let request = request.map(|Json(r)| r).unwrap_or_default();
    let container = handle_create_container(&state.pool, request).await?;
    Ok((StatusCode::CREATED, Json(container)))
}

/// GET /containers/{id}/items - List one group, or the ungrouped items, in position order.
async fn list_items(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Item>>> {
    let items = handle_list(&state.pool, &id, query).await?;
    Ok(Json(items))
}

/// POST /containers/{id}/items - Insert an item.
async fn create_item(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(request): Json<CreateItemRequest>,
) -> Result<(StatusCode, Json<Item>)> {
    let item = handle_create(&state.pool, &id, auth.actor(), request).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// PATCH /containers/{id}/items/{item_id} - Edit or move an item.
async fn update_item(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((id, item_id)): Path<(String, String)>,
    Json(changes): Json<ItemChanges>,
) -> Result<Json<Item>> {
    let item = handle_update(&state.pool, &id, &item_id, auth.actor(), changes).await?;
    Ok(Json(item))
}

/// DELETE /containers/{id}/items/{item_id} - Delete an item.
async fn delete_item(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((id, item_id)): Path<(String, String)>,
) -> Result<StatusCode> {
    handle_delete(&state.pool, &id, &item_id, auth.actor()).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /containers/{id}/items/{item_id}/group - Move an item to another group.
async fn reassign_group(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((id, item_id)): Path<(String, String)>,
    Json(group): Json<GroupKey>,
) -> Result<Json<Item>> {
    let item = handle_reassign(&state.pool, &id, &item_id, auth.actor(), group).await?;
    Ok(Json(item))
}

/// PUT /containers/{id}/order - Replace the order of the ungrouped items or of one group.
async fn reorder_items(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(request): Json<ReorderRequest>,
) -> Result<Json<Vec<Item>>> {
    let items = handle_reorder(&state.pool, &id, auth.actor(), request).await?;
    Ok(Json(items))
}

/// GET /containers/{id}/audit - Audit events, newest first.
async fn audit_log(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<String>,
    Query(query): Query<AuditQuery>,
) -> Result<Json<Vec<AuditEntry>>> {
    let entries = handle_audit_log(&state.pool, &id, query).await?;
    Ok(Json(entries))
}
