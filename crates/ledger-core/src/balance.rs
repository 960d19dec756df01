//! Balance calculation.
//!
//! There is no balance column anywhere. An account's balance is the sum of
//! its ledger rows, each signed by the [`TypeCatalog`]. The catalog is the
//! one place that decides whether a type is a credit or a debit; every
//! component that needs a balance is handed the same instance.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{LedgerError, Result, Transaction, TransactionType};

/// Direction a transaction type moves the balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sign {
    /// Adds to the balance.
    Credit,
    /// Subtracts from the balance.
    Debit,
}

impl Sign {
    /// Apply the sign to a positive amount.
    #[must_use]
    pub const fn apply(self, amount_cents: i64) -> i64 {
        match self {
            Self::Credit => amount_cents,
            Self::Debit => amount_cents.saturating_neg(),
        }
    }
}

/// Mapping from stored type name to [`Sign`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeCatalog {
    signs: BTreeMap<String, Sign>,
}

impl Default for TypeCatalog {
    fn default() -> Self {
        let signs = TransactionType::ALL
            .into_iter()
            .map(|t| (t.as_str().to_string(), default_sign(t)))
            .collect();
        Self { signs }
    }
}

const fn default_sign(transaction_type: TransactionType) -> Sign {
    match transaction_type {
        TransactionType::Deposit
        | TransactionType::TransferIn
        | TransactionType::InterestPayment
        | TransactionType::LoanDisbursement => Sign::Credit,
        TransactionType::Withdrawal
        | TransactionType::TransferOut
        | TransactionType::LoanPayment
        | TransactionType::ServiceCharge
        | TransactionType::MonthlyMaintenanceFee => Sign::Debit,
    }
}

/// Types the engine writes itself; a catalog without them cannot run.
pub const REQUIRED_TYPES: [TransactionType; 6] = [
    TransactionType::Deposit,
    TransactionType::Withdrawal,
    TransactionType::TransferIn,
    TransactionType::TransferOut,
    TransactionType::ServiceCharge,
    TransactionType::MonthlyMaintenanceFee,
];

impl TypeCatalog {
    /// Build a catalog from explicit entries.
    #[must_use]
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, Sign)>,
        S: Into<String>,
    {
        Self {
            signs: entries.into_iter().map(|(n, s)| (n.into(), s)).collect(),
        }
    }

    /// Sign of a stored type name, `None` when unmapped.
    #[must_use]
    pub fn sign_of(&self, type_name: &str) -> Option<Sign> {
        self.signs.get(type_name).copied()
    }

    /// Sign of a catalog type.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Configuration` if the type was removed from this catalog.
    pub fn require(&self, transaction_type: TransactionType) -> Result<Sign> {
        self.sign_of(transaction_type.as_str()).ok_or_else(|| {
            LedgerError::Configuration(format!(
                "transaction type '{transaction_type}' missing from catalog"
            ))
        })
    }

    /// Check that every type the engine writes is mapped.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Configuration` naming the first missing type.
    pub fn validate(&self) -> Result<()> {
        REQUIRED_TYPES
            .into_iter()
            .try_for_each(|t| self.require(t).map(|_| ()))
    }

    /// Signed contribution of one row; unmapped types contribute 0.
    #[must_use]
    pub fn signed_amount(&self, type_name: &str, amount_cents: i64) -> i64 {
        self.sign_of(type_name)
            .map_or(0, |sign| sign.apply(amount_cents))
    }

    /// Fold per-type totals (as returned by a `GROUP BY` query) into a balance.
    /// The sum saturates at the `i64` range.
    #[must_use]
    pub fn balance_from_totals<'a, I>(&self, totals: I) -> i64
    where
        I: IntoIterator<Item = (&'a str, i64)>,
    {
        totals
            .into_iter()
            .map(|(name, total)| self.signed_amount(name, total))
            .fold(0, i64::saturating_add)
    }

    /// Fold a full transaction list into a balance.
    #[must_use]
    pub fn balance_of(&self, transactions: &[Transaction]) -> i64 {
        transactions
            .iter()
            .map(|tx| self.signed_amount(&tx.transaction_type, tx.amount_cents))
            .fold(0, i64::saturating_add)
    }
}

/// Sum of amounts for one type name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeTotal {
    /// Stored type name.
    pub transaction_type: String,
    /// Sum of `amount_cents` for that type.
    pub total_cents: i64,
}
