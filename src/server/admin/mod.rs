mod catalog;
mod users;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::server::AppState;

pub fn admin_router() -> Router<Arc<AppState>> {
    Router::new()
        // User routes
        .route("/users", get(users::list_users))
        .route("/users/{id}/ban", put(users::set_ban))
        // Catalog routes
        .route("/cohorts", post(catalog::create_cohort))
        .route("/curriculum-projects", post(catalog::create_curriculum_project))
        .route("/students", post(catalog::create_student))
}
