//! Ledger Service - HTTP API for the account ledger
//!
//! This is the main entry point for the ledger service.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ledger_service::{build_engine, create_router, open_store, AppState, ServiceConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,ledger=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Ledger Service");

    // Load configuration from environment
    let config = ServiceConfig::from_env();
    let policy = config.load_policy()?;

    tracing::info!(
        listen_addr = %config.listen_addr,
        database_configured = %config.database_url.is_some(),
        policy_file = ?config.policy_file,
        fee_interval_days = policy.fee_interval_days,
        "Service configuration loaded"
    );

    let store = open_store(&config).await?;
    let engine = build_engine(store, policy);

    // Build app state
    let state = AppState::new(engine, config.clone());

    // Create the router
    let app = create_router(state);
    tracing::info!("Router configured with all API endpoints");

    // Start HTTP server
    tracing::info!(listen_addr = %config.listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
