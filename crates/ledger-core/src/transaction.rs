//! Ledger transaction types.
//!
//! Transactions are append-only. Corrections are made by writing offsetting
//! rows, never by updating or deleting an existing one.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{AccountId, EmployeeId, TransactionId};

/// A persisted ledger row.
///
/// `transaction_type` is kept as the stored catalog name rather than the
/// enum so rows written under an older catalog still load; the balance
/// calculator treats names it does not know as contributing nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Surrogate key.
    pub id: TransactionId,

    /// Human-readable reference shared by the rows of one transfer.
    pub reference: String,

    /// The account whose balance this row affects.
    pub account_id: AccountId,

    /// Counterparty account for transfers.
    pub related_account_id: Option<AccountId>,

    /// Catalog name of the transaction type (e.g. `"Withdrawal"`).
    pub transaction_type: String,

    /// Always positive; the sign comes from the type catalog.
    pub amount_cents: i64,

    /// Free-form description.
    pub description: String,

    /// The employee who performed the operation, if any.
    pub employee_id: Option<EmployeeId>,

    /// When the row was written.
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// The catalog type, if the stored name is a known one.
    #[must_use]
    pub fn kind(&self) -> Option<TransactionType> {
        self.transaction_type.parse().ok()
    }
}

/// A row about to be appended to the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    /// Generated reference.
    pub reference: String,
    /// Owning account.
    pub account_id: AccountId,
    /// Counterparty account for transfers.
    pub related_account_id: Option<AccountId>,
    /// Transaction type.
    pub transaction_type: TransactionType,
    /// Positive amount in cents.
    pub amount_cents: i64,
    /// Free-form description.
    pub description: String,
    /// Acting employee.
    pub employee_id: Option<EmployeeId>,
    /// Timestamp to persist.
    pub created_at: DateTime<Utc>,
}

/// The fixed catalog of transaction types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TransactionType {
    /// Cash or check deposit.
    #[serde(rename = "Deposit")]
    Deposit,

    /// Teller withdrawal.
    #[serde(rename = "Withdrawal")]
    Withdrawal,

    /// Receiving side of a transfer.
    #[serde(rename = "Transfer In")]
    TransferIn,

    /// Sending side of a transfer.
    #[serde(rename = "Transfer Out")]
    TransferOut,

    /// Interest credited by the bank.
    #[serde(rename = "Interest Payment")]
    InterestPayment,

    /// Loan proceeds credited to the account.
    #[serde(rename = "Loan Disbursement")]
    LoanDisbursement,

    /// Loan installment debited from the account.
    #[serde(rename = "Loan Payment")]
    LoanPayment,

    /// Service charge (transfer fees, flagged-account fees).
    #[serde(rename = "Service Charge")]
    ServiceCharge,

    /// Monthly fee for staying below the maintaining balance.
    #[serde(rename = "Monthly Maintenance Fee")]
    MonthlyMaintenanceFee,
}

impl TransactionType {
    /// Every catalog entry, in display order.
    pub const ALL: [Self; 9] = [
        Self::Deposit,
        Self::Withdrawal,
        Self::TransferIn,
        Self::TransferOut,
        Self::InterestPayment,
        Self::LoanDisbursement,
        Self::LoanPayment,
        Self::ServiceCharge,
        Self::MonthlyMaintenanceFee,
    ];

    /// The name stored in the `transaction_type` column.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Deposit => "Deposit",
            Self::Withdrawal => "Withdrawal",
            Self::TransferIn => "Transfer In",
            Self::TransferOut => "Transfer Out",
            Self::InterestPayment => "Interest Payment",
            Self::LoanDisbursement => "Loan Disbursement",
            Self::LoanPayment => "Loan Payment",
            Self::ServiceCharge => "Service Charge",
            Self::MonthlyMaintenanceFee => "Monthly Maintenance Fee",
        }
    }

    /// Three-letter prefix used in generated references.
    #[must_use]
    pub const fn reference_prefix(&self) -> &'static str {
        match self {
            Self::Deposit => "DEP",
            Self::Withdrawal => "WDR",
            Self::TransferIn | Self::TransferOut => "TRF",
            Self::InterestPayment => "INT",
            Self::LoanDisbursement => "LND",
            Self::LoanPayment => "LNP",
            Self::ServiceCharge => "SVC",
            Self::MonthlyMaintenanceFee => "MMF",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = crate::LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| crate::LedgerError::UnknownTransactionType(s.to_string()))
    }
}

/// Generate a transaction reference.
///
/// Format: `<PREFIX>-<YYYYMMDD>-<account id, 8 digits>-<4 random digits>`,
/// e.g. `WDR-20261016-00000042-0917`. Uniqueness is not checked.
#[must_use]
pub fn generate_reference(
    transaction_type: TransactionType,
    date: NaiveDate,
    account_id: AccountId,
) -> String {
    let suffix: u16 = rand::rng().random_range(0..10_000);
    format!(
        "{}-{}-{:08}-{suffix:04}",
        transaction_type.reference_prefix(),
        date.format("%Y%m%d"),
        account_id.get(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_names_parse_back() {
        for t in TransactionType::ALL {
            assert_eq!(t.as_str().parse::<TransactionType>().unwrap(), t);
        }
        assert!("Lottery Win".parse::<TransactionType>().is_err());
    }

    #[test]
    fn serde_uses_catalog_names() {
        let json = serde_json::to_string(&TransactionType::MonthlyMaintenanceFee).unwrap();
        assert_eq!(json, "\"Monthly Maintenance Fee\"");
    }

    #[test]
    fn reference_layout() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        let reference = generate_reference(TransactionType::Withdrawal, date, AccountId::new(42));

        let parts: Vec<&str> = reference.split('-').collect();
        assert_eq!(parts.len(), 4);
        assert_eq!(parts[0], "WDR");
        assert_eq!(parts[1], "20261016");
        assert_eq!(parts[2], "00000042");
        assert_eq!(parts[3].len(), 4);
        assert!(parts[3].chars().all(|c| c.is_ascii_digit()));
    }
}
