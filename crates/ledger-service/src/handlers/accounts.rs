//! Account inquiry handlers.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use ledger_core::{ArchivedAccount, FeeCharge, Transaction};
use ledger_engine::{AccountOverview, Reconciliation};
use ledger_store::Store;

use crate::auth::{AuthUser, EmployeeAuth};
use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::state::AppState;

/// Largest page the transaction listing returns.
const MAX_PAGE_SIZE: usize = 100;

/// Get an account with its computed balance and warnings.
pub async fn get_account(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(account_number): Path<String>,
) -> Result<Json<ApiResponse<AccountOverview>>, ApiError> {
    let overview = state.engine.account_overview(&account_number).await?;
    auth.ensure_can_view(&overview.account)?;

    Ok(ApiResponse::ok(
        format!("Account {account_number}"),
        overview,
    ))
}

/// Query parameters for listing transactions.
#[derive(Debug, Deserialize)]
pub struct ListTransactionsQuery {
    /// Maximum number of transactions to return.
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Offset for pagination.
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    50
}

/// Page of transactions.
#[derive(Debug, Serialize)]
pub struct ListTransactionsResponse {
    /// Transactions, newest first.
    pub transactions: Vec<Transaction>,
    /// Whether there are more transactions.
    pub has_more: bool,
}

/// List an account's transactions, newest first.
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(account_number): Path<String>,
    Query(query): Query<ListTransactionsQuery>,
) -> Result<Json<ApiResponse<ListTransactionsResponse>>, ApiError> {
    let account = state.engine.find_account(&account_number).await?;
    auth.ensure_can_view(&account)?;

    // Fetch one more than requested to determine has_more
    let limit = query.limit.min(MAX_PAGE_SIZE);
    let mut transactions = state
        .engine
        .store()
        .list_transactions(account.id, limit + 1, query.offset)
        .await?;

    let has_more = transactions.len() > limit;
    transactions.truncate(limit);

    Ok(ApiResponse::ok(
        format!("{} transactions", transactions.len()),
        ListTransactionsResponse {
            transactions,
            has_more,
        },
    ))
}

/// List an account's maintenance and service fee charges, newest first.
pub async fn list_fees(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(account_number): Path<String>,
) -> Result<Json<ApiResponse<Vec<FeeCharge>>>, ApiError> {
    let account = state.engine.find_account(&account_number).await?;
    auth.ensure_can_view(&account)?;

    let charges = state.engine.store().list_fee_charges(account.id).await?;

    Ok(ApiResponse::ok(
        format!("{} fee charges", charges.len()),
        charges,
    ))
}

/// Recompute the balance two ways and compare.
pub async fn reconcile(
    State(state): State<Arc<AppState>>,
    auth: EmployeeAuth,
    Path(account_number): Path<String>,
) -> Result<Json<ApiResponse<Reconciliation>>, ApiError> {
    let reconciliation = state.engine.reconcile(&account_number).await?;

    if !reconciliation.balanced {
        tracing::warn!(
            account_number = %account_number,
            employee_id = %auth.employee_id,
            "Reconciliation mismatch reported"
        );
    }

    let message = if reconciliation.balanced {
        "Ledger balanced"
    } else {
        "Ledger mismatch"
    };
    Ok(ApiResponse::ok(message, reconciliation))
}

/// Archive and close an account immediately.
pub async fn archive_account(
    State(state): State<Arc<AppState>>,
    auth: EmployeeAuth,
    Path(account_number): Path<String>,
) -> Result<Json<ApiResponse<ArchivedAccount>>, ApiError> {
    let archive = state.engine.archive(&account_number).await?;

    tracing::info!(
        account_number = %account_number,
        employee_id = %auth.employee_id,
        "Account archived by employee"
    );

    Ok(ApiResponse::ok(
        format!("Account {account_number} archived and closed"),
        archive,
    ))
}
