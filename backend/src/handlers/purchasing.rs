//! HTTP handlers for procurement endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use shared::{PurchaseOrder, PurchaseRequest};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::{require_admin, require_edit, CurrentUser};
use crate::services::purchasing::{CreatePrInput, PurchasingService, ReceiveInput};
use crate::AppState;

/// List purchase requests
pub async fn list_purchase_requests(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<Vec<PurchaseRequest>>> {
    let service = PurchasingService::new(state.db, &state.config);
    let prs = service.list_prs().await?;
    Ok(Json(prs))
}

/// Get a purchase request
pub async fn get_purchase_request(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<PurchaseRequest>> {
    let service = PurchasingService::new(state.db, &state.config);
    let pr = service.get_pr(id).await?;
    Ok(Json(pr))
}

/// Create a purchase request in DRAFT
pub async fn create_purchase_request(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreatePrInput>,
) -> AppResult<Json<PurchaseRequest>> {
    require_edit(&current_user.0)?;
    let service = PurchasingService::new(state.db, &state.config);
    let pr = service.create_pr(&current_user.0.name, input).await?;
    Ok(Json(pr))
}

/// Approve a purchase request (DRAFT only)
pub async fn approve_purchase_request(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<PurchaseRequest>> {
    require_admin(&current_user.0)?;
    let service = PurchasingService::new(state.db, &state.config);
    let pr = service.approve_pr(id).await?;
    Ok(Json(pr))
}

/// Convert a purchase request into a purchase order
pub async fn convert_to_purchase_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<PurchaseOrder>> {
    require_edit(&current_user.0)?;
    let service = PurchasingService::new(state.db, &state.config);
    let po = service.convert_to_po(id, &current_user.0.name).await?;
    Ok(Json(po))
}

/// List purchase orders
pub async fn list_purchase_orders(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<Vec<PurchaseOrder>>> {
    let service = PurchasingService::new(state.db, &state.config);
    let pos = service.list_pos().await?;
    Ok(Json(pos))
}

/// Get a purchase order
pub async fn get_purchase_order(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<PurchaseOrder>> {
    let service = PurchasingService::new(state.db, &state.config);
    let po = service.get_po(id).await?;
    Ok(Json(po))
}

/// Receive goods against a purchase order
pub async fn receive_purchase_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(input): Json<ReceiveInput>,
) -> AppResult<Json<PurchaseOrder>> {
    require_edit(&current_user.0)?;
    let service = PurchasingService::new(state.db, &state.config);
    let po = service.receive_po(id, &current_user.0.name, input).await?;
    Ok(Json(po))
}
