//! Teller withdrawals and deposits.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use ledger_core::format_cents;
use ledger_engine::Receipt;

use crate::auth::EmployeeAuth;
use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::state::AppState;

/// Withdrawal or deposit request.
#[derive(Debug, Deserialize)]
pub struct TellerRequest {
    /// Account number.
    pub account_number: String,
    /// Amount in cents.
    pub amount_cents: i64,
}

/// Withdraw cash over the counter.
pub async fn withdraw(
    State(state): State<Arc<AppState>>,
    auth: EmployeeAuth,
    Json(body): Json<TellerRequest>,
) -> Result<Json<ApiResponse<Receipt>>, ApiError> {
    let receipt = state
        .engine
        .withdraw(&body.account_number, body.amount_cents, auth.actor())
        .await?;

    tracing::info!(
        account_number = %body.account_number,
        employee_id = %auth.employee_id,
        amount_cents = body.amount_cents,
        "Withdrawal processed"
    );

    let message = format!(
        "Withdrew {} from {}",
        format_cents(body.amount_cents),
        body.account_number
    );
    Ok(ApiResponse::ok(message, receipt))
}

/// Deposit cash over the counter.
pub async fn deposit(
    State(state): State<Arc<AppState>>,
    auth: EmployeeAuth,
    Json(body): Json<TellerRequest>,
) -> Result<Json<ApiResponse<Receipt>>, ApiError> {
    let receipt = state
        .engine
        .deposit(&body.account_number, body.amount_cents, auth.actor())
        .await?;

    tracing::info!(
        account_number = %body.account_number,
        employee_id = %auth.employee_id,
        amount_cents = body.amount_cents,
        "Deposit processed"
    );

    let message = format!(
        "Deposited {} to {}",
        format_cents(body.amount_cents),
        body.account_number
    );
    Ok(ApiResponse::ok(message, receipt))
}
