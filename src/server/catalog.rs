use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
};

use crate::server::AppState;
use crate::server::dto::ProjectListParams;
use crate::server::response::{ApiError, ApiResponse, StoreOptionExt, StoreResultExt};
use crate::workflow::catalog;

pub async fn list_projects(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ProjectListParams>,
) -> impl IntoResponse {
    let projects = catalog::list_projects(state.store.as_ref(), &params.into())?;
    Ok::<_, ApiError>(Json(ApiResponse::success(projects)))
}

pub async fn get_project(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> impl IntoResponse {
    let project = state
        .store
        .get_published_project_by_slug(&slug)
        .api_err("Failed to get project")?
        .or_not_found("Project not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(project)))
}

pub async fn list_cohorts(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let cohorts = state.store.list_cohorts().api_err("Failed to list cohorts")?;
    Ok::<_, ApiError>(Json(ApiResponse::success(cohorts)))
}

pub async fn get_cohort(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    let cohort = state
        .store
        .get_cohort(id)
        .api_err("Failed to get cohort")?
        .or_not_found("Cohort not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(cohort)))
}

pub async fn list_curriculum_projects(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let projects = state
        .store
        .list_curriculum_projects()
        .api_err("Failed to list curriculum projects")?;
    Ok::<_, ApiError>(Json(ApiResponse::success(projects)))
}

pub async fn get_curriculum_project(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    let project = state
        .store
        .get_curriculum_project(id)
        .api_err("Failed to get curriculum project")?
        .or_not_found("Curriculum project not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(project)))
}

pub async fn list_students(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let students = state.store.list_students().api_err("Failed to list students")?;
    Ok::<_, ApiError>(Json(ApiResponse::success(students)))
}

pub async fn get_student(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    let student = state
        .store
        .get_student(id)
        .api_err("Failed to get student")?
        .or_not_found("Student not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(student)))
}

pub fn catalog_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/projects", get(list_projects))
        .route("/projects/{slug}", get(get_project))
        .route("/cohorts", get(list_cohorts))
        .route("/cohorts/{id}", get(get_cohort))
        .route("/curriculum-projects", get(list_curriculum_projects))
        .route("/curriculum-projects/{id}", get(get_curriculum_project))
        .route("/students", get(list_students))
        .route("/students/{id}", get(get_student))
}
