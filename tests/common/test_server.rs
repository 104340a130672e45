use std::sync::Arc;

use adaverse::auth::{API_KEY_HEADER, ServiceKeyMode};
use adaverse::server::{AppState, create_router};
use adaverse::store::{SqliteStore, Store};
use adaverse::types::{Role, User};
use adaverse::workflow;
use chrono::NaiveDate;
use tempfile::TempDir;
use tokio::task::JoinHandle;

pub const API_KEY: &str = "test-service-key";

pub struct TestServer {
    pub temp_dir: TempDir,
    pub base_url: String,
    pub store: Arc<SqliteStore>,
    pub client: reqwest::Client,
    server_task: JoinHandle<()>,
}

impl TestServer {
    pub async fn start() -> Self {
        Self::start_with(ServiceKeyMode::Required(API_KEY.to_string())).await
    }

    /// Starts the router in-process on an ephemeral port.
    pub async fn start_with(service_key: ServiceKeyMode) -> Self {
        let temp_dir = TempDir::new().expect("create temp dir");
        let store = Arc::new(
            SqliteStore::new(temp_dir.path().join("adaverse.db")).expect("open database"),
        );
        store.initialize().expect("initialize schema");

        let state = Arc::new(AppState::new(store.clone(), service_key));
        let app = create_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let port = listener.local_addr().expect("local addr").port();

        let server_task = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve");
        });

        Self {
            temp_dir,
            base_url: format!("http://127.0.0.1:{port}"),
            store,
            client: reqwest::Client::new(),
            server_task,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Request builder carrying the service key.
    pub fn keyed(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, self.url(path))
            .header(API_KEY_HEADER, API_KEY)
    }

    /// Creates a user and returns it with a fresh session token.
    pub fn user(&self, name: &str, role: Role) -> (User, String) {
        let email = format!("{}@example.com", name.to_lowercase().replace(' ', "."));
        let user = workflow::create_user(self.store.as_ref(), name, &email, role)
            .expect("create user");
        let token = workflow::open_session(self.store.as_ref(), &user.id, None)
            .expect("open session");
        (user, token)
    }

    /// One cohort with two students (ids 1 and 2) and one curriculum project.
    pub fn seed_catalog(&self) {
        let start = NaiveDate::from_ymd_opt(2024, 1, 15).expect("valid date");
        let cohort = self
            .store
            .create_cohort("Frida Kahlo", start)
            .expect("create cohort");
        self.store
            .create_student("Ada Lovelace", "ada", cohort.id)
            .expect("create student");
        self.store
            .create_student("Grace Hopper", "grace", cohort.id)
            .expect("create student");
        self.store
            .create_curriculum_project("AdaCheck")
            .expect("create curriculum project");
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.server_task.abort();
    }
}
