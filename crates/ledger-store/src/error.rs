//! Error types for ledger storage.

use ledger_core::LedgerError;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// SQLSTATE codes that mean "someone else holds or changed this row".
const CONFLICT_SQLSTATES: [&str; 3] = [
    "40001", // serialization_failure
    "40P01", // deadlock_detected
    "55P03", // lock_not_available (lock_timeout)
];

/// SQLSTATE for unique constraint violations.
const UNIQUE_VIOLATION: &str = "23505";

/// Errors that can occur in storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(String),

    /// A row could not be decoded into a domain type.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Record not found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Entity type.
        entity: &'static str,
        /// Identifier.
        id: String,
    },

    /// Lock timeout, deadlock or serialization failure. Nothing was written.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Unique constraint violated.
    #[error("duplicate: {0}")]
    Duplicate(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if let Some(code) = db.code() {
                if CONFLICT_SQLSTATES.contains(&code.as_ref()) {
                    return Self::Conflict(db.message().to_string());
                }
                if code == UNIQUE_VIOLATION {
                    return Self::Duplicate(db.message().to_string());
                }
            }
        }
        match err {
            sqlx::Error::RowNotFound => Self::NotFound {
                entity: "row",
                id: String::new(),
            },
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                Self::Serialization(err.to_string())
            }
            other => Self::Database(other.to_string()),
        }
    }
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { id, .. } => Self::AccountNotFound { account: id },
            StoreError::Conflict(msg) => Self::Conflict(msg),
            StoreError::Database(msg)
            | StoreError::Serialization(msg)
            | StoreError::Duplicate(msg) => Self::Storage(msg),
        }
    }
}

impl From<LedgerError> for StoreError {
    fn from(err: LedgerError) -> Self {
        Self::Serialization(err.to_string())
    }
}
