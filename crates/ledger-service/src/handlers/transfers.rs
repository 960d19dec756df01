//! Fund transfers.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use ledger_core::format_cents;
use ledger_engine::{TransferReceipt, TransferRequest};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::state::AppState;

/// Transfer funds to another account here or at another bank.
///
/// Customers may only send from their own accounts; employees may send on a
/// customer's behalf.
pub async fn create_transfer(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(body): Json<TransferRequest>,
) -> Result<Json<ApiResponse<TransferReceipt>>, ApiError> {
    let receipt = state.engine.transfer(&body, auth.actor).await?;

    tracing::info!(
        reference = %receipt.reference,
        actor = %auth.actor,
        amount_cents = receipt.amount_cents,
        fee_cents = receipt.fee_cents,
        "Transfer processed"
    );

    let message = if receipt.fee_cents > 0 {
        format!(
            "Transferred {} (fee {})",
            format_cents(receipt.amount_cents),
            format_cents(receipt.fee_cents)
        )
    } else {
        format!("Transferred {}", format_cents(receipt.amount_cents))
    };
    Ok(ApiResponse::ok(message, receipt))
}
