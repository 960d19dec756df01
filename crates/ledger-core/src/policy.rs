//! Tunable rules for fees, lifecycle escalation and transfer pricing.

use serde::{Deserialize, Serialize};

use crate::{LedgerError, Result, TypeCatalog};

/// Days between two maintenance/service fee charges.
pub const DEFAULT_FEE_INTERVAL_DAYS: i64 = 30;

/// Months below maintaining before an account is flagged for removal.
pub const DEFAULT_FLAG_AFTER_MONTHS: i32 = 5;

/// Months below maintaining before an account is archived and closed.
pub const DEFAULT_ARCHIVE_AFTER_MONTHS: i32 = 6;

/// Days a flagged account has to recover before it is closed.
pub const DEFAULT_CLOSURE_WARNING_DAYS: i64 = 30;

/// Flat fee for a transfer to another customer's account, in cents (15.00).
pub const DEFAULT_INTER_CUSTOMER_FEE_CENTS: i64 = 1_500;

/// Flat fee for a transfer to another bank, in cents (25.00).
pub const DEFAULT_OTHER_BANK_FEE_CENTS: i64 = 2_500;

/// Reason stored on archive snapshots written by the lifecycle.
pub const DEFAULT_ARCHIVE_REASON: &str = "Below maintaining balance for 6 months";

/// All tunables in one place. Loaded from a JSON policy file when present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerPolicy {
    /// Days between fee charges.
    pub fee_interval_days: i64,

    /// Months below maintaining before flagging.
    pub flag_after_months: i32,

    /// Months below maintaining before archival.
    pub archive_after_months: i32,

    /// Days between flagging and automatic closure.
    pub closure_warning_days: i64,

    /// Transfer fee between different customers, in cents.
    pub inter_customer_fee_cents: i64,

    /// Transfer fee to another bank, in cents.
    pub other_bank_fee_cents: i64,

    /// Reason written to archive snapshots.
    pub archive_reason: String,

    /// Transaction type → sign mapping.
    pub catalog: TypeCatalog,
}

impl Default for LedgerPolicy {
    fn default() -> Self {
        Self {
            fee_interval_days: DEFAULT_FEE_INTERVAL_DAYS,
            flag_after_months: DEFAULT_FLAG_AFTER_MONTHS,
            archive_after_months: DEFAULT_ARCHIVE_AFTER_MONTHS,
            closure_warning_days: DEFAULT_CLOSURE_WARNING_DAYS,
            inter_customer_fee_cents: DEFAULT_INTER_CUSTOMER_FEE_CENTS,
            other_bank_fee_cents: DEFAULT_OTHER_BANK_FEE_CENTS,
            archive_reason: DEFAULT_ARCHIVE_REASON.to_string(),
            catalog: TypeCatalog::default(),
        }
    }
}

impl LedgerPolicy {
    /// Reject nonsensical values and catalogs missing engine-written types.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Configuration` describing the first problem.
    pub fn validate(&self) -> Result<()> {
        if self.fee_interval_days <= 0 {
            return Err(LedgerError::Configuration(
                "fee_interval_days must be positive".into(),
            ));
        }
        if self.closure_warning_days < 0 {
            return Err(LedgerError::Configuration(
                "closure_warning_days must not be negative".into(),
            ));
        }
        if self.flag_after_months <= 0 || self.archive_after_months < self.flag_after_months {
            return Err(LedgerError::Configuration(
                "archive_after_months must be >= flag_after_months > 0".into(),
            ));
        }
        if self.inter_customer_fee_cents < 0 || self.other_bank_fee_cents < 0 {
            return Err(LedgerError::Configuration(
                "transfer fees must not be negative".into(),
            ));
        }
        self.catalog.validate()
    }
}
