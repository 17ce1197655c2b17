use crate::auth::Claims;
use crate::error::{AppError, AppResult};
use crate::middleware_impls::RequestContext;
use crate::models::{ShortenRequest, UrlMappingDto};
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json};
use axum::Extension;
use std::sync::Arc;
use validator::Validate;

use super::helpers::current_user;
use super::types::AppJson;
use super::AppState;

/// Shorten a URL for the authenticated user
pub async fn shorten(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    AppJson(payload): AppJson<ShortenRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::InvalidUrl(format!("Validation failed: {}", e)))?;

    let user = current_user(&state, &claims).await?;
    let mapping = state.links.shorten(&payload.original_url, user.id).await?;

    Ok(Json(UrlMappingDto::new(
        mapping,
        &state.base_url,
        0,
        &user.username,
    )))
}

/// List the authenticated user's short URLs, newest first
pub async fn my_urls(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
) -> AppResult<impl IntoResponse> {
    let user = current_user(&state, &claims).await?;

    let urls: Vec<UrlMappingDto> = state
        .links
        .list_for_owner(user.id)
        .await?
        .into_iter()
        .map(|(mapping, clicks)| UrlMappingDto::new(mapping, &state.base_url, clicks, &user.username))
        .collect();

    Ok(Json(urls))
}

/// Resolve a short code and redirect to its original URL
pub async fn resolve_url(
    State(state): State<Arc<AppState>>,
    Extension(context): Extension<RequestContext>,
    Path(code): Path<String>,
) -> AppResult<impl IntoResponse> {
    let target = state
        .redirects
        .resolve(&code, context.click_metadata())
        .await?;

    Ok((StatusCode::FOUND, [(header::LOCATION, target)]))
}
