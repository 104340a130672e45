use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};

use crate::auth::RequireAdmin;
use crate::server::AppState;
use crate::server::dto::{CreateCohortRequest, CreateCurriculumProjectRequest, CreateStudentRequest};
use crate::server::response::{ApiError, ApiResponse};
use crate::workflow::catalog;

pub async fn create_cohort(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    body: Result<Json<CreateCohortRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(req) = body?;
    let cohort = catalog::create_cohort(state.store.as_ref(), &req.name, &req.start_date)?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(cohort))))
}

pub async fn create_curriculum_project(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    body: Result<Json<CreateCurriculumProjectRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(req) = body?;
    let project = catalog::create_curriculum_project(state.store.as_ref(), &req.name)?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(project))))
}

pub async fn create_student(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    body: Result<Json<CreateStudentRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(req) = body?;
    let student = catalog::create_student(
        state.store.as_ref(),
        &req.name,
        &req.github_username,
        req.cohort_id,
    )?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(student))))
}
