//! Reporting handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use ledger_engine::Statistics;

use crate::auth::EmployeeAuth;
use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::state::AppState;

/// Refresh lifecycle statuses and return account statistics.
pub async fn statistics(
    State(state): State<Arc<AppState>>,
    auth: EmployeeAuth,
) -> Result<Json<ApiResponse<Statistics>>, ApiError> {
    let stats = state.engine.refresh_statistics().await?;

    tracing::debug!(
        employee_id = %auth.employee_id,
        total_accounts = stats.total_accounts,
        "Statistics served"
    );

    let message = format!("{} accounts", stats.total_accounts);
    Ok(ApiResponse::ok(message, stats))
}
