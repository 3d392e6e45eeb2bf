//! HTTP handler for the dashboard summary endpoint

use axum::{extract::State, Json};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::dashboard::{DashboardService, DashboardSummary};
use crate::AppState;

/// Headline counts for the dashboard
pub async fn dashboard_summary(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<DashboardSummary>> {
    let service = DashboardService::new(state.db);
    let summary = service.summary().await?;
    Ok(Json(summary))
}
