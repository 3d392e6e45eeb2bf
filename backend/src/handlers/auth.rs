//! HTTP handlers for authentication endpoints

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::error::AppResult;
use crate::services::auth::{AuthService, AuthTokens, RegisterInput, RegisterResponse};
use crate::AppState;

/// Login request payload
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Refresh token request payload
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Register a new user account
pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterInput>,
) -> AppResult<Json<RegisterResponse>> {
    let service = AuthService::new(state.db, &state.config);
    let response = service.register(input).await?;
    Ok(Json(response))
}

/// Authenticate with email and password
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<AuthTokens>> {
    let service = AuthService::new(state.db, &state.config);
    let tokens = service.login(&input.email, &input.password).await?;
    Ok(Json(tokens))
}

/// Exchange a refresh token for a new token pair
pub async fn refresh(
    State(state): State<AppState>,
    Json(input): Json<RefreshRequest>,
) -> AppResult<Json<AuthTokens>> {
    let service = AuthService::new(state.db, &state.config);
    let tokens = service.refresh_token(&input.refresh_token).await?;
    Ok(Json(tokens))
}
