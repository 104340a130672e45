use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};

use crate::auth::{ServiceKey, SessionUser};
use crate::server::AppState;
use crate::server::dto::{CreateCommentRequest, DeletedResponse, UpdateCommentRequest};
use crate::server::response::{ApiError, ApiResponse, StoreResultExt, WorkflowResultExt};
use crate::workflow;

pub async fn list_project_comments(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<i64>,
) -> impl IntoResponse {
    let comments = state
        .store
        .list_project_comments(project_id)
        .api_err("Failed to list comments")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(comments)))
}

pub async fn create_comment(
    _key: ServiceKey,
    SessionUser(user): SessionUser,
    State(state): State<Arc<AppState>>,
    body: Result<Json<CreateCommentRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(req) = body?;
    let comment = workflow::add_comment(state.store.as_ref(), &user, req.project_id, &req.content)
        .not_found_as("Project not found")?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(comment))))
}

pub async fn update_comment(
    _key: ServiceKey,
    SessionUser(user): SessionUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    body: Result<Json<UpdateCommentRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(req) = body?;
    let comment = workflow::edit_comment(state.store.as_ref(), &user, id, &req.content)
        .not_found_as("Comment not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(comment)))
}

pub async fn delete_comment(
    _key: ServiceKey,
    SessionUser(user): SessionUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    workflow::remove_comment(state.store.as_ref(), &user, id)
        .not_found_as("Comment not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(DeletedResponse { id, deleted: true })))
}

/// Comment reads are public; writes need the service key and a session.
pub fn comments_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/comments/project/{id}", get(list_project_comments))
        .route("/comments", post(create_comment))
        .route("/comments/{id}", put(update_comment).delete(delete_comment))
}
