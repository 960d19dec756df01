//! Error types for the ledger.

use crate::ids::IdError;
use crate::money::MAX_AMOUNT_CENTS;

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Errors that can occur in ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Amount was zero, negative, or otherwise unusable.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// Account not found.
    #[error("account not found: {account}")]
    AccountNotFound {
        /// The account number or id that was not found.
        account: String,
    },

    /// Account is locked.
    #[error("account {account_number} is locked")]
    AccountLocked {
        /// The locked account.
        account_number: String,
    },

    /// Account is closed.
    #[error("account {account_number} is closed")]
    AccountClosed {
        /// The closed account.
        account_number: String,
    },

    /// Account is flagged for removal and cannot be debited.
    #[error("account {account_number} is flagged for removal")]
    AccountFlagged {
        /// The flagged account.
        account_number: String,
    },

    /// Insufficient funds for the operation.
    #[error("insufficient funds: balance={balance}, required={required}")]
    InsufficientFunds {
        /// Current balance in cents.
        balance: i64,
        /// Required amount in cents.
        required: i64,
    },

    /// Sender and receiver are the same account.
    #[error("cannot transfer to the same account")]
    SameAccount,

    /// The caller may not act on this account.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// A stored or requested transaction type is not in the catalog enum.
    #[error("unknown transaction type: {0}")]
    UnknownTransactionType(String),

    /// Archiving was requested for an account that is already closed.
    #[error("account {account_number} is already closed")]
    AlreadyClosed {
        /// The account.
        account_number: String,
    },

    /// Row lock could not be acquired, deadlock, or serialization failure.
    #[error("concurrent update conflict: {0}")]
    Conflict(String),

    /// Storage error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Invalid identifier.
    #[error("invalid identifier: {0}")]
    InvalidId(#[from] IdError),
}

impl LedgerError {
    /// Validation errors are rejected before any write and never retried.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidAmount(_)
                | Self::AccountNotFound { .. }
                | Self::AccountLocked { .. }
                | Self::AccountClosed { .. }
                | Self::AccountFlagged { .. }
                | Self::InsufficientFunds { .. }
                | Self::SameAccount
                | Self::Forbidden(_)
                | Self::UnknownTransactionType(_)
                | Self::AlreadyClosed { .. }
                | Self::InvalidId(_)
        )
    }

    /// Conflicts leave nothing written and the whole request may be retried.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }

    /// Configuration errors abort a whole batch.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

/// Validate that an amount is strictly positive and at most
/// [`MAX_AMOUNT_CENTS`](crate::money::MAX_AMOUNT_CENTS).
///
/// # Errors
///
/// Returns `LedgerError::InvalidAmount` for zero, negative or oversized amounts.
pub fn ensure_positive(amount_cents: i64) -> Result<()> {
    if amount_cents <= 0 {
        return Err(LedgerError::InvalidAmount(format!(
            "amount must be positive, got {amount_cents}"
        )));
    }
    if amount_cents > MAX_AMOUNT_CENTS {
        return Err(LedgerError::InvalidAmount(format!(
            "amount must not exceed {MAX_AMOUNT_CENTS}, got {amount_cents}"
        )));
    }
    Ok(())
}
