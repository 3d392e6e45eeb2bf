//! HTTP handlers for supplier endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use shared::Supplier;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::{require_admin, require_edit, CurrentUser};
use crate::services::supplier::{BulkSupplierUpdate, SupplierInput, SupplierService};
use crate::AppState;

/// List suppliers
pub async fn list_suppliers(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<Vec<Supplier>>> {
    let service = SupplierService::new(state.db);
    let suppliers = service.list().await?;
    Ok(Json(suppliers))
}

/// Get a supplier
pub async fn get_supplier(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Supplier>> {
    let service = SupplierService::new(state.db);
    let supplier = service.get(id).await?;
    Ok(Json(supplier))
}

/// Create a supplier
pub async fn create_supplier(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<SupplierInput>,
) -> AppResult<Json<Supplier>> {
    require_edit(&current_user.0)?;
    let service = SupplierService::new(state.db);
    let supplier = service.create(input).await?;
    Ok(Json(supplier))
}

/// Replace a supplier's details
pub async fn update_supplier(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(input): Json<SupplierInput>,
) -> AppResult<Json<Supplier>> {
    require_edit(&current_user.0)?;
    let service = SupplierService::new(state.db);
    let supplier = service.update(id, input).await?;
    Ok(Json(supplier))
}

/// Delete a supplier
pub async fn delete_supplier(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    require_admin(&current_user.0)?;
    let service = SupplierService::new(state.db);
    service.delete(id).await?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}

/// Patch several suppliers with the same field-level update
pub async fn bulk_update_suppliers(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<BulkSupplierUpdate>,
) -> AppResult<Json<Vec<Supplier>>> {
    require_edit(&current_user.0)?;
    let service = SupplierService::new(state.db);
    let suppliers = service.bulk_update(input).await?;
    Ok(Json(suppliers))
}
