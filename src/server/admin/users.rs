use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    response::IntoResponse,
};

use crate::auth::RequireAdmin;
use crate::server::AppState;
use crate::server::dto::{BanRequest, BanResponse};
use crate::server::response::{ApiError, ApiResponse, StoreResultExt, WorkflowResultExt};
use crate::workflow;

pub async fn list_users(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let users = state.store.list_users().api_err("Failed to list users")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(users)))
}

pub async fn set_ban(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Result<Json<BanRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(req) = body?;
    let banned = req
        .banned
        .as_bool()
        .ok_or_else(|| ApiError::bad_request("The banned field must be a boolean"))?;

    let user = workflow::set_banned(state.store.as_ref(), &admin, &id, banned)
        .not_found_as("User not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(BanResponse::from(user))))
}
