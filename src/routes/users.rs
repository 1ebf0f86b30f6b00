// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User CRUD, search and map tile routes.

use crate::error::{AppError, Result};
use crate::models::{SortField, SortOrder, User, UserFilter};
use crate::services::validation::{clamp_page_size, DEFAULT_PAGE_SIZE};
use crate::time_utils::parse_rfc3339_utc;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/v1/users", get(search_users).post(create_user))
        .route(
            "/api/v1/users/{id}",
            get(get_user)
                .put(replace_user)
                .patch(update_user)
                .delete(delete_user),
        )
        .route("/api/v1/users/{id}/map", get(get_user_map))
}

// ─── Query Parsing ───────────────────────────────────────────

/// Raw query string for the search endpoint. Values are kept as strings so
/// empty parameters can be treated as absent and parse failures reported
/// as 400 with a useful message.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub lat: Option<String>,
    pub lon: Option<String>,
    pub radius: Option<String>,
    pub social_net: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub page: Option<String>,
    pub size: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_number<T: FromStr>(name: &str, value: Option<String>) -> Result<Option<T>> {
    non_empty(value)
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|_| AppError::InvalidInput(format!("Invalid '{}' parameter: {}", name, raw)))
        })
        .transpose()
}

fn parse_date(
    name: &str,
    value: Option<String>,
) -> Result<Option<chrono::DateTime<chrono::Utc>>> {
    non_empty(value)
        .map(|raw| {
            parse_rfc3339_utc(&raw).ok_or_else(|| {
                AppError::InvalidInput(format!(
                    "Invalid '{}' parameter: must be RFC3339 datetime",
                    name
                ))
            })
        })
        .transpose()
}

fn parse_sort_field(value: Option<String>) -> Result<Option<SortField>> {
    non_empty(value)
        .map(|raw| match raw.to_lowercase().as_str() {
            "login" => Ok(SortField::Login),
            "reg_date" => Ok(SortField::RegDate),
            _ => Err(AppError::InvalidInput(format!(
                "Invalid 'sort_by' parameter: {} (expected login or reg_date)",
                raw
            ))),
        })
        .transpose()
}

fn parse_sort_order(value: Option<String>) -> Result<Option<SortOrder>> {
    non_empty(value)
        .map(|raw| match raw.to_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(AppError::InvalidInput(format!(
                "Invalid 'sort_order' parameter: {} (expected asc or desc)",
                raw
            ))),
        })
        .transpose()
}

impl SearchParams {
    pub fn into_filter(self) -> Result<UserFilter> {
        Ok(UserFilter {
            search: non_empty(self.q),
            date_from: parse_date("date_from", self.date_from)?,
            date_to: parse_date("date_to", self.date_to)?,
            lat: parse_number("lat", self.lat)?,
            lon: parse_number("lon", self.lon)?,
            distance: non_empty(self.radius),
            social_net: non_empty(self.social_net),
            sort_by: parse_sort_field(self.sort_by)?,
            sort_order: parse_sort_order(self.sort_order)?,
            page: parse_number("page", self.page)?,
            size: parse_number("size", self.size)?,
        })
    }
}

// ─── Search ──────────────────────────────────────────────────

#[derive(Serialize)]
pub struct SearchResponse {
    pub users: Vec<User>,
    pub total: usize,
    pub page: i64,
    pub size: i64,
}

async fn search_users(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>> {
    let mut filter = params.into_filter()?;
    clamp_page_size(&mut filter);

    let page = filter.page.filter(|p| *p > 0).unwrap_or(1);
    let size = filter.size.unwrap_or(DEFAULT_PAGE_SIZE);
    filter.size = Some(size);

    let users = state.user_service.search_users(filter).await?;

    Ok(Json(SearchResponse {
        total: users.len(),
        users,
        page,
        size,
    }))
}

// ─── CRUD ────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct CreateUserResponse {
    pub user_id: String,
}

async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(user): Json<User>,
) -> Result<(StatusCode, Json<CreateUserResponse>)> {
    let created = state.user_service.create_user(user).await?;
    let user_id = created
        .id
        .ok_or_else(|| AppError::internal("Created user has no identifier"))?;

    Ok((StatusCode::CREATED, Json(CreateUserResponse { user_id })))
}

async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<User>> {
    Ok(Json(state.user_service.get_user(&id).await?))
}

/// Full replace. The path identifier wins over any identifier in the body.
async fn replace_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(mut user): Json<User>,
) -> Result<Json<User>> {
    user.id = Some(id);
    Ok(Json(state.user_service.replace_user(user).await?))
}

async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(mut user): Json<User>,
) -> Result<Json<User>> {
    user.id = Some(id);
    Ok(Json(state.user_service.update_user_partial(user).await?))
}

async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.user_service.delete_user(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ─── Map ─────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct MapParams {
    pub zoom: Option<String>,
}

async fn get_user_map(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<MapParams>,
) -> Result<impl IntoResponse> {
    let zoom = parse_number::<u8>("zoom", params.zoom)?.unwrap_or(state.config.map_zoom);

    let tile = state.user_service.get_map_tile(&id, zoom).await?;

    Ok(([(header::CONTENT_TYPE, "image/png")], tile))
}
