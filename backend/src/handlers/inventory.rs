//! HTTP handlers for inventory endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use shared::{InventoryFilter, InventoryItem, ReorderSuggestion};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::{require_admin, require_edit, CurrentUser};
use crate::services::inventory::{InventoryBulkPatch, InventoryInput, InventoryService};
use crate::AppState;

/// Payload for bulk updates: target IDs plus the patch to apply
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkUpdateRequest {
    pub ids: Vec<Uuid>,
    pub patch: InventoryBulkPatch,
}

/// Payload for bulk deletes
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkDeleteRequest {
    pub ids: Vec<Uuid>,
}

/// List inventory items with optional filters
pub async fn list_inventory(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(filter): Query<InventoryFilter>,
) -> AppResult<Json<Vec<InventoryItem>>> {
    let service = InventoryService::new(state.db);
    let items = service.list(filter).await?;
    Ok(Json(items))
}

/// Get an inventory item
pub async fn get_inventory_item(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<InventoryItem>> {
    let service = InventoryService::new(state.db);
    let item = service.get(id).await?;
    Ok(Json(item))
}

/// Create an inventory item
pub async fn create_inventory_item(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<InventoryInput>,
) -> AppResult<Json<InventoryItem>> {
    require_edit(&current_user.0)?;
    let service = InventoryService::new(state.db);
    let item = service.create(input).await?;
    Ok(Json(item))
}

/// Update an inventory item's metadata (stock is never touched here)
pub async fn update_inventory_item(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(input): Json<InventoryInput>,
) -> AppResult<Json<InventoryItem>> {
    require_edit(&current_user.0)?;
    let service = InventoryService::new(state.db);
    let item = service.update(id, input).await?;
    Ok(Json(item))
}

/// Delete an inventory item
pub async fn delete_inventory_item(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    require_admin(&current_user.0)?;
    let service = InventoryService::new(state.db);
    service.delete(id).await?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}

/// Apply a partial update to several items
pub async fn bulk_update_inventory(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<BulkUpdateRequest>,
) -> AppResult<Json<Vec<InventoryItem>>> {
    require_edit(&current_user.0)?;
    let service = InventoryService::new(state.db);
    let items = service.bulk_update(&request.ids, &request.patch).await?;
    Ok(Json(items))
}

/// Delete several items
pub async fn bulk_delete_inventory(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<BulkDeleteRequest>,
) -> AppResult<Json<serde_json::Value>> {
    require_admin(&current_user.0)?;
    let service = InventoryService::new(state.db);
    let deleted = service.bulk_delete(&request.ids).await?;
    Ok(Json(serde_json::json!({ "deleted": deleted })))
}

/// Items at or below their effective reorder point
pub async fn list_low_stock(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<Vec<InventoryItem>>> {
    let service = InventoryService::new(state.db);
    let items = service.low_stock().await?;
    Ok(Json(items))
}

/// Replenishment proposals for low-stock items
pub async fn list_reorder_suggestions(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<Vec<ReorderSuggestion>>> {
    let service = InventoryService::new(state.db);
    let suggestions = service.reorder_report().await?;
    Ok(Json(suggestions))
}
