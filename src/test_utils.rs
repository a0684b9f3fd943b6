#[cfg(test)]
pub mod test_utils {
    use crate::auth::TokenKeys;
    use crate::router::create_router;
    use crate::schemas::{ApiResponse, AppState};
    use axum::http::{header, HeaderName, HeaderValue, StatusCode};
    use axum::Router;
    use axum_test::TestServer;
    use compute::OverflowScope;
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{Database, DatabaseConnection};
    use serde_json::{json, Value};
    use std::sync::Arc;

    /// Secret used to sign tokens in tests.
    pub const TEST_SECRET: &[u8] = b"test-secret";

    /// Create an in-memory SQLite database for testing
    pub async fn setup_test_db() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("Failed to connect to in-memory database");

        Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");

        db
    }

    /// Create AppState for testing
    pub async fn setup_test_app_state(overflow_scope: OverflowScope) -> AppState {
        AppState {
            db: setup_test_db().await,
            auth: Arc::new(TokenKeys::new(TEST_SECRET, 60)),
            overflow_scope,
        }
    }

    /// Logs to the test writer, filtered by `RUST_LOG`.
    fn init_test_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    /// Create axum app for testing
    pub async fn setup_test_app(overflow_scope: OverflowScope) -> Router {
        init_test_tracing();
        create_router(setup_test_app_state(overflow_scope).await)
    }

    /// Test server backed by a fresh database.
    pub async fn setup_test_server() -> TestServer {
        setup_test_server_with_scope(OverflowScope::SameOwner).await
    }

    /// Test server whose recurrences overflow per `overflow_scope`.
    pub async fn setup_test_server_with_scope(overflow_scope: OverflowScope) -> TestServer {
        TestServer::new(setup_test_app(overflow_scope).await).expect("Failed to start test server")
    }

    /// Registers `username` and returns its bearer token.
    pub async fn register_user(server: &TestServer, username: &str) -> String {
        let response = server
            .post("/api/v1/register")
            .json(&json!({
                "username": username,
                "first_name": "Test",
                "last_name": "User",
                "email": format!("{}@example.com", username),
                "password": "s3cure-password",
                "password_confirmation": "s3cure-password",
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: ApiResponse<Value> = response.json();
        body.data["access_token"]
            .as_str()
            .expect("token in registration response")
            .to_string()
    }

    /// `Authorization` header carrying `token`.
    pub fn bearer(token: &str) -> (HeaderName, HeaderValue) {
        (
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).expect("valid header value"),
        )
    }
}
