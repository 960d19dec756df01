//! Identifier types for the ledger.
//!
//! Database rows use `BIGSERIAL` surrogate keys, so most identifiers are
//! strongly-typed wrappers around `i64`. Batch runs get a random UUID so
//! their log lines can be correlated.
//!
//! # Macro-based ID Types
//!
//! The `int_id_type!` macro reduces boilerplate for integer identifier types,
//! ensuring consistent implementation of serialization, parsing, and display traits.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Macro to define an `i64`-based identifier type with standard trait implementations.
///
/// This macro generates a newtype wrapper around `i64` with implementations for:
/// - `Clone`, `Copy`, `PartialEq`, `Eq`, `PartialOrd`, `Ord`, `Hash`
/// - `Serialize`, `Deserialize` (as a bare number)
/// - `FromStr`, `Display`, `Debug`
/// - `From<i64>`, `Into<i64>`
///
/// # Example
///
/// ```ignore
/// int_id_type!(MyId, "A custom identifier type.");
/// let id = MyId::new(42);
/// let parsed: MyId = id.to_string().parse().unwrap();
/// ```
macro_rules! int_id_type {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wrap a raw database key.
            #[must_use]
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            /// Return the raw database key.
            #[must_use]
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let value = s.trim().parse::<i64>().map_err(|_| IdError::InvalidInteger)?;
                if value <= 0 {
                    return Err(IdError::NotPositive);
                }
                Ok(Self(value))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

int_id_type!(AccountId, "Surrogate key of an account row.");
int_id_type!(TransactionId, "Surrogate key of a ledger transaction row.");
int_id_type!(FeeChargeId, "Surrogate key of a service fee charge audit row.");
int_id_type!(CustomerId, "A customer (account owner) identifier.");
int_id_type!(EmployeeId, "An employee (teller/administrator) identifier.");

/// Identifier of one nightly or reporting batch run.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RunId(uuid::Uuid);

impl RunId {
    /// Generate a new random run identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Return the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }
}

impl FromStr for RunId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let uuid = uuid::Uuid::parse_str(s).map_err(|_| IdError::InvalidUuid)?;
        Ok(Self(uuid))
    }
}

impl fmt::Debug for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RunId({})", self.0)
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for RunId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RunId> for String {
    fn from(id: RunId) -> Self {
        id.0.to_string()
    }
}

/// Errors that can occur when parsing identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// The input is not an integer.
    #[error("invalid integer identifier")]
    InvalidInteger,

    /// Surrogate keys start at 1.
    #[error("identifier must be positive")]
    NotPositive,

    /// The input is not a valid UUID.
    #[error("invalid UUID format")]
    InvalidUuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_id_roundtrip() {
        let id = AccountId::new(42);
        let parsed = AccountId::from_str(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn account_id_serializes_as_number() {
        let json = serde_json::to_string(&AccountId::new(7)).unwrap();
        assert_eq!(json, "7");
        let parsed: AccountId = serde_json::from_str("7").unwrap();
        assert_eq!(parsed.get(), 7);
    }

    #[test]
    fn non_positive_ids_rejected() {
        assert_eq!(EmployeeId::from_str("0"), Err(IdError::NotPositive));
        assert_eq!(CustomerId::from_str("-3"), Err(IdError::NotPositive));
        assert_eq!(CustomerId::from_str("abc"), Err(IdError::InvalidInteger));
    }

    #[test]
    fn run_id_serde_json() {
        let id = RunId::generate();
        let json = serde_json::to_string(&id).unwrap();
        let parsed: RunId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, parsed);
    }
}
