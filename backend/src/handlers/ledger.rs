//! HTTP handlers for stock transaction endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use shared::StockTxn;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::{require_edit, CurrentUser};
use crate::services::ledger::{LedgerService, TxnInput};
use crate::AppState;

/// List stock transactions, newest first
pub async fn list_transactions(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<Vec<StockTxn>>> {
    let service = LedgerService::new(state.db);
    let txns = service.list().await?;
    Ok(Json(txns))
}

/// Get a stock transaction
pub async fn get_transaction(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<StockTxn>> {
    let service = LedgerService::new(state.db);
    let txn = service.get(id).await?;
    Ok(Json(txn))
}

/// Record a stock transaction
pub async fn record_transaction(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<TxnInput>,
) -> AppResult<Json<StockTxn>> {
    require_edit(&current_user.0)?;
    let service = LedgerService::new(state.db);
    let txn = service.record(&current_user.0.name, input).await?;
    Ok(Json(txn))
}

/// Amend a stock transaction, reversing and reapplying its effect
pub async fn amend_transaction(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(input): Json<TxnInput>,
) -> AppResult<Json<StockTxn>> {
    require_edit(&current_user.0)?;
    let service = LedgerService::new(state.db);
    let txn = service.amend(id, input).await?;
    Ok(Json(txn))
}

/// Delete a stock transaction, reversing its effect
pub async fn delete_transaction(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    require_edit(&current_user.0)?;
    let service = LedgerService::new(state.db);
    service.delete(id).await?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}
