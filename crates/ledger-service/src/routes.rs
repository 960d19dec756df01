//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{accounts, health, jobs, reports, teller, transfers};
use crate::state::AppState;

// ============================================================================
// Concurrency Limiting Constants
// ============================================================================

/// Maximum concurrent requests for general API endpoints.
const API_MAX_CONCURRENT_REQUESTS: usize = 50;

/// Batch jobs walk every account; only one may run through the API at a time.
const JOB_MAX_CONCURRENT_REQUESTS: usize = 1;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check
///
/// ## Teller (employee JWT)
/// - `POST /v1/teller/withdrawals` - Withdraw cash
/// - `POST /v1/teller/deposits` - Deposit cash
///
/// ## Transfers (customer or employee JWT)
/// - `POST /v1/transfers` - Transfer funds
///
/// ## Accounts (owning customer or employee JWT)
/// - `GET /v1/accounts/:number` - Account with computed balance
/// - `GET /v1/accounts/:number/transactions` - Transaction history
/// - `GET /v1/accounts/:number/fees` - Fee charge history
/// - `GET /v1/accounts/:number/reconcile` - Balance reconciliation (employee)
/// - `POST /v1/accounts/:number/archive` - Archive and close (employee)
///
/// ## Reports (employee JWT)
/// - `GET /v1/reports/statistics` - Refresh statuses and report statistics
///
/// ## Jobs (Service API Key auth)
/// - `POST /v1/jobs/nightly` - Run the nightly maintenance batch
pub fn create_router(state: AppState) -> Router {
    // Extract config values before moving state
    let cors_origins = state.config.cors_origins.clone();
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout_seconds = state.config.request_timeout_seconds;

    // Build CORS layer
    let cors = build_cors_layer(&cors_origins);

    let state = Arc::new(state);

    let job_routes = Router::new()
        .route("/nightly", post(jobs::run_nightly))
        .layer(ConcurrencyLimitLayer::new(JOB_MAX_CONCURRENT_REQUESTS));

    let api_routes = Router::new()
        // Teller
        .route("/teller/withdrawals", post(teller::withdraw))
        .route("/teller/deposits", post(teller::deposit))
        // Transfers
        .route("/transfers", post(transfers::create_transfer))
        // Accounts
        .route("/accounts/:number", get(accounts::get_account))
        .route(
            "/accounts/:number/transactions",
            get(accounts::list_transactions),
        )
        .route("/accounts/:number/fees", get(accounts::list_fees))
        .route("/accounts/:number/reconcile", get(accounts::reconcile))
        .route("/accounts/:number/archive", post(accounts::archive_account))
        // Reports
        .route("/reports/statistics", get(reports::statistics))
        // Jobs (with their own concurrency limit)
        .nest("/jobs", job_routes)
        .layer(ConcurrencyLimitLayer::new(API_MAX_CONCURRENT_REQUESTS));

    Router::new()
        // Health (public, no rate limit)
        .route("/health", get(health::health))
        // API v1 routes (rate limited)
        .nest("/v1", api_routes)
        // Global middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            request_timeout_seconds,
        )))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
