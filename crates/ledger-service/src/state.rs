//! Application state.

use std::sync::Arc;

use ledger_core::{LedgerPolicy, SystemClock};
use ledger_engine::Engine;
use ledger_store::{MemoryStore, PgStore, Store, StoreError};

use crate::config::ServiceConfig;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The ledger engine.
    pub engine: Engine,

    /// Service configuration.
    pub config: ServiceConfig,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(engine: Engine, config: ServiceConfig) -> Self {
        if config.service_api_key.is_none() {
            tracing::warn!("SERVICE_API_KEY not set - job endpoints will reject every request");
        }

        Self { engine, config }
    }
}

/// Open the configured store: PostgreSQL when `DATABASE_URL` is set (running
/// migrations), the in-memory store otherwise.
///
/// # Errors
///
/// Returns an error if the database is unreachable or migrations fail.
pub async fn open_store(config: &ServiceConfig) -> Result<Arc<dyn Store>, StoreError> {
    if let Some(url) = &config.database_url {
        tracing::info!(
            max_connections = config.database_max_connections,
            lock_timeout_ms = config.lock_timeout_ms,
            "Connecting to PostgreSQL"
        );
        let store = PgStore::connect(
            url,
            config.database_max_connections,
            config.lock_timeout_ms,
        )
        .await?;
        store.migrate().await?;
        tracing::info!("Database migrations applied");
        Ok(Arc::new(store))
    } else {
        tracing::warn!("DATABASE_URL not set - using in-memory store, data will not persist");
        Ok(Arc::new(MemoryStore::new()))
    }
}

/// Build an engine over `store` with the wall clock.
#[must_use]
pub fn build_engine(store: Arc<dyn Store>, policy: LedgerPolicy) -> Engine {
    Engine::new(store, Arc::new(SystemClock), policy)
}
