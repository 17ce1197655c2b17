use crate::auth::{verify_password, LoginRequest, LoginResponse};
use crate::error::{AppError, AppResult};
use axum::extract::State;
use axum::response::{IntoResponse, Json};
use std::sync::Arc;
use validator::Validate;

use super::types::AppJson;
use super::AppState;

/// Login to get JWT token
pub async fn login(
    State(state): State<Arc<AppState>>,
    AppJson(payload): AppJson<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    // Unknown user and wrong password are indistinguishable to the caller
    let user = state
        .users
        .find_by_username(&payload.username)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    if !verify_password(&payload.password, &user.password_hash)? {
        tracing::info!(username = %payload.username, "Rejected login with wrong password");
        return Err(AppError::InvalidCredentials);
    }

    if !user.is_active {
        return Err(AppError::Unauthorized("User account is inactive".to_string()));
    }

    let token = state
        .auth_service
        .generate_token(&user.id.to_string(), &user.username, user.role()?)?;

    Ok(Json(LoginResponse {
        token,
        username: user.username,
    }))
}
