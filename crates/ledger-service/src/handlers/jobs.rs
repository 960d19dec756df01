//! Batch job triggers.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use ledger_engine::NightlyReport;

use crate::auth::ServiceAuth;
use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::run_log::append_run_log;
use crate::state::AppState;

/// Run the nightly maintenance batch now.
///
/// The run log is appended to `NIGHTLY_LOG_PATH` when configured. A failed
/// log write is reported in the service log only.
pub async fn run_nightly(
    State(state): State<Arc<AppState>>,
    auth: ServiceAuth,
) -> Result<Json<ApiResponse<NightlyReport>>, ApiError> {
    tracing::info!(service = %auth.service_name, "Nightly run requested");

    let report = state.engine.run_nightly().await?;

    if let Some(path) = &state.config.nightly_log_path {
        if let Err(e) = append_run_log(path, &report).await {
            tracing::error!(error = %e, path = %path, "Failed to write nightly run log");
        }
    }

    let message = format!(
        "Processed {} accounts, {} failures",
        report.accounts_processed, report.failures
    );
    Ok(ApiResponse::ok(message, report))
}
