//! Common test utilities for guia-service integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::Arc;

use axum::Router;
use axum_test::TestServer;
use tempfile::TempDir;

use guia_core::UserId;
use guia_oracle::mock::MockOracle;
use guia_service::{create_router, AppState, ServiceConfig};
use guia_store::RocksStore;

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// Temporary directory for the database (kept alive for test duration).
    pub _temp_dir: TempDir,
    /// Direct handle to the store, for seeding records the API cannot create.
    pub store: Arc<RocksStore>,
    /// The scripted oracle backing the reading endpoints.
    pub oracle: MockOracle,
    /// A test user ID for authenticated requests.
    pub test_user_id: UserId,
}

impl TestHarness {
    /// Create a new test harness with a fresh database and an unscripted
    /// oracle (answers [`MockOracle::DEFAULT_REPLY`]).
    pub fn new() -> Self {
        Self::with_oracle(MockOracle::new())
    }

    /// Create a harness around a scripted oracle.
    pub fn with_oracle(oracle: MockOracle) -> Self {
        Self::customized(oracle, |_| {})
    }

    /// Create a harness with a scripted oracle and config overrides.
    pub fn customized(oracle: MockOracle, tweak: impl FnOnce(&mut ServiceConfig)) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store =
            Arc::new(RocksStore::open(temp_dir.path()).expect("Failed to open store"));

        let mut config = ServiceConfig {
            listen_addr: "127.0.0.1:0".into(),
            data_dir: temp_dir.path().to_string_lossy().to_string(),
            auth_base_url: "http://localhost".into(),
            allow_test_tokens: true,
            admin_api_key: Some("test-admin-key".into()),
            stripe_webhook_secret: Some("whsec_test".into()),
            pix_webhook_secret: Some("pix_test_secret".into()),
            ..ServiceConfig::default()
        };
        tweak(&mut config);

        let state =
            AppState::new(Arc::clone(&store), config).with_oracle(Arc::new(oracle.clone()));
        let router: Router = create_router(state);

        let server = TestServer::new(router).expect("Failed to create test server");
        let test_user_id = UserId::generate();

        Self {
            server,
            _temp_dir: temp_dir,
            store,
            oracle,
            test_user_id,
        }
    }

    /// Get the authorization header for user authentication.
    pub fn user_auth_header(&self) -> String {
        format!("Bearer test-token:{}", self.test_user_id)
    }

    /// Get a different user's auth header (for testing isolation).
    pub fn other_user_auth_header() -> String {
        let other_user = UserId::generate();
        format!("Bearer test-token:{}", other_user)
    }

    /// Register the test user (grants the welcome bonus).
    pub async fn create_user(&self) {
        self.server
            .post("/v1/users")
            .add_header("authorization", self.user_auth_header())
            .await
            .assert_status_ok();
    }

    /// Register the test user and complete onboarding with a typical profile.
    pub async fn onboard(&self) {
        self.create_user().await;
        self.server
            .post("/v1/users/me/onboarding")
            .add_header("authorization", self.user_auth_header())
            .json(&serde_json::json!({
                "display_name": "Maria",
                "birth_date": "1990-03-25",
                "relationship_status": "solteira",
                "focus": "love"
            }))
            .await
            .assert_status_ok();
    }

    /// Current balance straight from the API.
    pub async fn balance(&self) -> i64 {
        let response = self
            .server
            .get("/v1/points/balance")
            .add_header("authorization", self.user_auth_header())
            .await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        body["balance_points"].as_i64().expect("balance_points")
    }

    /// Admin-grant points to the test user.
    pub async fn grant(&self, amount: i64) {
        self.server
            .post("/v1/points/grant")
            .add_header("x-admin-key", "test-admin-key")
            .json(&serde_json::json!({
                "user_id": self.test_user_id.to_string(),
                "amount_points": amount,
                "reason": "Crédito de teste"
            }))
            .await
            .assert_status_ok();
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
