//! HTTP handlers for order schedule endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::{require_edit, CurrentUser};
use crate::services::schedule::{
    RescheduleInput, ScheduleInput, ScheduleReceiveInput, ScheduleService, ScheduleView,
    StatusInput,
};
use crate::AppState;

/// List order schedules with derived display states
pub async fn list_schedules(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<Vec<ScheduleView>>> {
    let service = ScheduleService::new(state.db);
    let schedules = service.list().await?;
    Ok(Json(schedules))
}

/// Get an order schedule
pub async fn get_schedule(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ScheduleView>> {
    let service = ScheduleService::new(state.db);
    let schedule = service.get(id).await?;
    Ok(Json(schedule))
}

/// Create an order schedule
pub async fn create_schedule(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<ScheduleInput>,
) -> AppResult<Json<ScheduleView>> {
    require_edit(&current_user.0)?;
    let service = ScheduleService::new(state.db);
    let schedule = service.create(&current_user.0.name, input).await?;
    Ok(Json(schedule))
}

/// Replace an open schedule's date, supplier, remark and lines
pub async fn update_schedule(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(input): Json<ScheduleInput>,
) -> AppResult<Json<ScheduleView>> {
    require_edit(&current_user.0)?;
    let service = ScheduleService::new(state.db);
    let schedule = service.update(id, input).await?;
    Ok(Json(schedule))
}

/// Delete an order schedule
pub async fn delete_schedule(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    require_edit(&current_user.0)?;
    let service = ScheduleService::new(state.db);
    service.delete(id).await?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}

/// Postpone an open schedule
pub async fn reschedule(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(input): Json<RescheduleInput>,
) -> AppResult<Json<ScheduleView>> {
    require_edit(&current_user.0)?;
    let service = ScheduleService::new(state.db);
    let schedule = service.reschedule(id, input).await?;
    Ok(Json(schedule))
}

/// Cancel or complete an open schedule
pub async fn set_schedule_status(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(input): Json<StatusInput>,
) -> AppResult<Json<ScheduleView>> {
    require_edit(&current_user.0)?;
    let service = ScheduleService::new(state.db);
    let schedule = service.set_status(id, input).await?;
    Ok(Json(schedule))
}

/// Receive goods against an open schedule
pub async fn receive_schedule(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(input): Json<ScheduleReceiveInput>,
) -> AppResult<Json<ScheduleView>> {
    require_edit(&current_user.0)?;
    let service = ScheduleService::new(state.db);
    let schedule = service.receive(id, &current_user.0.name, input).await?;
    Ok(Json(schedule))
}
