use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
};

use crate::auth::{OptionalSession, RequireAdmin, ServiceKey};
use crate::server::AppState;
use crate::server::dto::{DeletedResponse, SubmitProjectRequest};
use crate::server::response::{ApiError, ApiResponse, StoreResultExt, WorkflowResultExt};
use crate::workflow;

pub async fn submit_project(
    _key: ServiceKey,
    OptionalSession(user): OptionalSession,
    State(state): State<Arc<AppState>>,
    body: Result<Json<SubmitProjectRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(req) = body?;
    let submission = req.into_submission()?;
    let pending = workflow::submit_project(
        state.store.as_ref(),
        submission,
        user.as_ref().map(|u| u.id.as_str()),
    )?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(pending))))
}

pub async fn list_pending(_key: ServiceKey, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let pending = state
        .store
        .list_pending_projects()
        .api_err("Failed to list pending projects")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(pending)))
}

pub async fn reject(
    _key: ServiceKey,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    workflow::reject(state.store.as_ref(), id)
        .not_found_as("Pending project not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(DeletedResponse { id, deleted: true })))
}

pub async fn approve(
    _key: ServiceKey,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    let published = workflow::approve(state.store.as_ref(), id)
        .not_found_as("Pending project not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(published)))
}

pub async fn approve_all(_admin: RequireAdmin, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let report = workflow::approve_all(state.store.as_ref())?;
    Ok::<_, ApiError>(Json(ApiResponse::success(report)))
}

pub async fn reject_all(_admin: RequireAdmin, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let report = workflow::reject_all(state.store.as_ref())?;
    Ok::<_, ApiError>(Json(ApiResponse::success(report)))
}

pub fn moderation_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/pending-projects", post(submit_project))
        .route("/pending-projects", get(list_pending))
        .route("/pending-projects/approve-all", post(approve_all))
        .route("/pending-projects/reject-all", post(reject_all))
        .route("/pending-projects/{id}", delete(reject))
        .route("/pending-projects/{id}/approve", post(approve))
}
