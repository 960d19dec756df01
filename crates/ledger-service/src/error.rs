//! API error types and responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use ledger_core::LedgerError;

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Unauthorized - missing or invalid credentials.
    #[error("unauthorized")]
    Unauthorized,

    /// Forbidden - valid credentials but insufficient permissions.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Bad request - invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The account's state does not allow the operation.
    #[error("{message}")]
    AccountState {
        /// Machine-readable reason.
        code: &'static str,
        /// Human-readable message.
        message: String,
    },

    /// Insufficient funds.
    #[error("insufficient funds: balance={balance}, required={required}")]
    InsufficientFunds {
        /// Current balance in cents.
        balance: i64,
        /// Required amount in cents.
        required: i64,
    },

    /// Concurrent update conflict; nothing was written and the request may be retried.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    success: bool,
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match &self {
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                self.to_string(),
                None,
            ),
            Self::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg.clone(), None),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone(), None),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone(), None),
            Self::AccountState { code, message } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                *code,
                message.clone(),
                None,
            ),
            Self::InsufficientFunds { balance, required } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "insufficient_funds",
                self.to_string(),
                Some(serde_json::json!({
                    "balance": balance,
                    "required": required
                })),
            ),
            Self::Conflict(msg) => (
                StatusCode::CONFLICT,
                "conflict",
                msg.clone(),
                Some(serde_json::json!({ "retryable": true })),
            ),
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = ErrorResponse {
            success: false,
            error: ErrorBody {
                code: code.to_string(),
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        let message = err.to_string();
        if err.is_retryable() {
            return Self::Conflict(message);
        }
        if !err.is_validation() {
            return Self::Internal(message);
        }
        match err {
            LedgerError::InvalidAmount(_)
            | LedgerError::SameAccount
            | LedgerError::UnknownTransactionType(_)
            | LedgerError::InvalidId(_) => Self::BadRequest(message),
            LedgerError::AccountNotFound { .. } => Self::NotFound(message),
            LedgerError::AccountLocked { .. } => Self::AccountState {
                code: "account_locked",
                message,
            },
            LedgerError::AccountClosed { .. } | LedgerError::AlreadyClosed { .. } => {
                Self::AccountState {
                    code: "account_closed",
                    message,
                }
            }
            LedgerError::AccountFlagged { .. } => Self::AccountState {
                code: "account_flagged",
                message,
            },
            LedgerError::InsufficientFunds { balance, required } => {
                Self::InsufficientFunds { balance, required }
            }
            LedgerError::Forbidden(msg) => Self::Forbidden(msg),
            // Handled above.
            LedgerError::Conflict(_) | LedgerError::Storage(_) | LedgerError::Configuration(_) => {
                Self::Internal(message)
            }
        }
    }
}

impl From<ledger_store::StoreError> for ApiError {
    fn from(err: ledger_store::StoreError) -> Self {
        LedgerError::from(err).into()
    }
}
