//! Nightly maintenance batch.
//!
//! Charges due maintenance and service fees, escalates and recovers account
//! statuses and archives accounts below maintaining for too long. Intended to
//! be run once a day by cron or a similar scheduler. Exits non-zero when the
//! run aborts; per-account failures are reported in the run log.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ledger_service::{append_run_log, build_engine, open_store, ServiceConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,ledger=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServiceConfig::from_env();
    let policy = config.load_policy()?;
    let store = open_store(&config).await?;
    let engine = build_engine(store, policy);

    let report = engine.run_nightly().await?;

    match &config.nightly_log_path {
        Some(path) => {
            append_run_log(path, &report).await?;
            tracing::info!(path = %path, "Run log written");
        }
        None => print!("{}", report.render()),
    }

    if report.failures > 0 {
        tracing::warn!(failures = report.failures, "Nightly run finished with failures");
    }

    Ok(())
}
