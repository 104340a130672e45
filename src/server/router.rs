use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::Request;
use axum::http::{
    HeaderName, Method,
    header::{AUTHORIZATION, CONTENT_TYPE},
};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::{Router, routing::get};
use tower_http::cors::{Any, CorsLayer};

use super::admin::admin_router;
use super::catalog::catalog_router;
use super::comments::comments_router;
use super::moderation::moderation_router;
use crate::auth::{API_KEY_HEADER, ServiceKeyMode};
use crate::store::Store;

pub struct AppState {
    pub store: Arc<dyn Store>,
    pub service_key: ServiceKeyMode,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, service_key: ServiceKeyMode) -> Self {
        Self { store, service_key }
    }
}

async fn health() -> &'static str {
    "OK"
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;

    let latency = start.elapsed();
    let status = response.status();

    tracing::info!(
        "{} {} {} {}ms",
        method,
        uri.path(),
        status.as_u16(),
        latency.as_millis()
    );

    response
}

fn public_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            CONTENT_TYPE,
            AUTHORIZATION,
            HeaderName::from_static(API_KEY_HEADER),
        ])
        .max_age(Duration::from_secs(60 * 60))
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(catalog_router().layer(public_cors()))
        .merge(comments_router().layer(public_cors()))
        .merge(moderation_router())
        .nest("/admin", admin_router())
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use super::*;
    use crate::store::SqliteStore;

    fn router() -> Router {
        let store = SqliteStore::in_memory().unwrap();
        store.initialize().unwrap();
        let state = Arc::new(AppState::new(
            Arc::new(store),
            ServiceKeyMode::Required("k".to_string()),
        ));
        create_router(state)
    }

    #[tokio::test]
    async fn test_health() {
        let response = router()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_session_sets_www_authenticate() {
        let response = router()
            .oneshot(
                Request::post("/comments")
                    .header("x-api-key", "k")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"projectId":1,"content":"hi"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get("www-authenticate").unwrap(),
            "Bearer realm=\"adaverse\""
        );
    }

    #[tokio::test]
    async fn test_admin_routes_check_service_key_first() {
        let response = router()
            .oneshot(Request::get("/admin/users").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = router()
            .oneshot(
                Request::get("/admin/users")
                    .header(API_KEY_HEADER, "wrong")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
