//! Common test utilities for ledger service integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum_test::TestServer;
use chrono::{NaiveDate, Utc};
use tempfile::TempDir;

use ledger_core::{Actor, CustomerId, EmployeeId, FixedClock, LedgerPolicy, NewAccount};
use ledger_engine::Engine;
use ledger_service::auth::{issue_token, JwtClaims, Role};
use ledger_service::{create_router, AppState, ServiceConfig};
use ledger_store::{MemoryStore, Store};

/// Secret used to sign test tokens.
pub const JWT_SECRET: &str = "test-jwt-secret";

/// Employee id carried by the default teller token.
pub const TELLER_ID: i64 = 77;

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// Direct handle on the store for setup and assertions.
    pub store: MemoryStore,
    /// The engine behind the server.
    pub engine: Engine,
    /// The clock the engine reads.
    pub clock: Arc<FixedClock>,
    /// Temporary directory for the nightly run log (kept alive for test duration).
    pub temp_dir: TempDir,
    /// The service API key for job requests.
    pub service_api_key: String,
}

impl TestHarness {
    /// Create a new test harness with a fresh in-memory store.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = MemoryStore::new();
        let clock = Arc::new(FixedClock::on(
            NaiveDate::from_ymd_opt(2026, 1, 5).expect("valid date"),
        ));
        let engine = Engine::new(
            Arc::new(store.clone()),
            clock.clone(),
            LedgerPolicy::default(),
        );

        let service_api_key = "test-service-key".to_string();

        let config = ServiceConfig {
            listen_addr: "127.0.0.1:0".into(),
            jwt_secret: JWT_SECRET.into(),
            service_api_key: Some(service_api_key.clone()),
            nightly_log_path: Some(
                temp_dir
                    .path()
                    .join("nightly.log")
                    .to_string_lossy()
                    .to_string(),
            ),
            ..ServiceConfig::default()
        };

        let state = AppState::new(engine.clone(), config);
        let router: Router = create_router(state);

        let server = TestServer::new(router).expect("Failed to create test server");

        Self {
            server,
            store,
            engine,
            clock,
            temp_dir,
            service_api_key,
        }
    }

    /// Open an account with a 100.00 maintaining balance and a 3.00 fee.
    pub async fn open_account(&self, number: &str, customer: i64) {
        self.store
            .create_account(
                &NewAccount {
                    account_number: number.into(),
                    customer_id: CustomerId::new(customer),
                    account_type: "savings".into(),
                    maintaining_balance_cents: 10_000,
                    monthly_fee_cents: 300,
                },
                Utc::now(),
            )
            .await
            .expect("create account");
    }

    /// Seed a balance without going through HTTP.
    pub async fn seed_deposit(&self, number: &str, amount_cents: i64) {
        self.engine
            .deposit(number, amount_cents, Actor::Employee(EmployeeId::new(TELLER_ID)))
            .await
            .expect("seed deposit");
    }

    /// Get the authorization header for the default teller.
    pub fn employee_auth_header(&self) -> String {
        bearer(&TELLER_ID.to_string(), Role::Employee)
    }

    /// Get the authorization header for a customer.
    pub fn customer_auth_header(&self, customer: i64) -> String {
        bearer(&customer.to_string(), Role::Customer)
    }

    /// Path of the nightly run log.
    pub fn nightly_log_path(&self) -> PathBuf {
        self.temp_dir.path().join("nightly.log")
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

fn bearer(sub: &str, role: Role) -> String {
    let claims = JwtClaims {
        sub: sub.into(),
        role,
        exp: Utc::now().timestamp() + 3600,
    };
    let token = issue_token(&claims, JWT_SECRET).expect("sign token");
    format!("Bearer {token}")
}
