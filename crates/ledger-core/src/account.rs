//! Account types.
//!
//! An account carries its maintaining-balance requirement, fee settings and
//! lifecycle bookkeeping. It never carries a balance; see [`crate::balance`].

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{AccountId, CustomerId, LedgerError, Result};

/// Smallest balance that counts as "holding money" when an account has no
/// maintaining requirement configured.
pub const MINIMUM_POSITIVE_BALANCE_CENTS: i64 = 1;

/// A deposit account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Surrogate key.
    pub id: AccountId,

    /// Human-readable, unique account number.
    pub account_number: String,

    /// Owning customer.
    pub customer_id: CustomerId,

    /// Product name (e.g. `"savings"`, `"checking"`).
    pub account_type: String,

    /// Minimum balance required to avoid fees and escalation, in cents.
    pub maintaining_balance_cents: i64,

    /// Fee charged every fee interval while below maintaining, in cents.
    pub monthly_fee_cents: i64,

    /// Frozen accounts accept no debits and are skipped by batch jobs.
    pub is_locked: bool,

    /// Lifecycle status.
    pub status: AccountStatus,

    /// Day the balance first fell under the requirement.
    pub below_maintaining_since: Option<NaiveDate>,

    /// Day the last maintenance/service fee was charged.
    pub last_service_fee_date: Option<NaiveDate>,

    /// Day the account was flagged for removal.
    pub closure_warning_date: Option<NaiveDate>,

    /// Day the account was closed.
    pub closure_date: Option<NaiveDate>,

    /// When the account was opened.
    pub created_at: DateTime<Utc>,

    /// When the row was last written.
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Balance below which the account is considered below maintaining.
    ///
    /// With no requirement configured this is one cent, so an empty account
    /// is still below maintaining.
    #[must_use]
    pub fn maintaining_threshold_cents(&self) -> i64 {
        self.maintaining_balance_cents
            .max(MINIMUM_POSITIVE_BALANCE_CENTS)
    }

    /// Whether `balance_cents` is under the maintaining threshold.
    #[must_use]
    pub fn is_below_maintaining(&self, balance_cents: i64) -> bool {
        balance_cents < self.maintaining_threshold_cents()
    }

    /// Locked or closed accounts are never evaluated or mutated.
    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.is_locked || self.status == AccountStatus::Closed
    }

    /// Reject debits from locked, closed or flagged accounts.
    ///
    /// # Errors
    ///
    /// Returns the matching validation error.
    pub fn ensure_debit_allowed(&self) -> Result<()> {
        if self.status == AccountStatus::Closed {
            return Err(LedgerError::AccountClosed {
                account_number: self.account_number.clone(),
            });
        }
        if self.is_locked {
            return Err(LedgerError::AccountLocked {
                account_number: self.account_number.clone(),
            });
        }
        if self.status == AccountStatus::FlaggedForRemoval {
            return Err(LedgerError::AccountFlagged {
                account_number: self.account_number.clone(),
            });
        }
        Ok(())
    }

    /// Reject credits to locked or closed accounts. Flagged accounts may
    /// still receive money so they can recover.
    ///
    /// # Errors
    ///
    /// Returns the matching validation error.
    pub fn ensure_credit_allowed(&self) -> Result<()> {
        if self.status == AccountStatus::Closed {
            return Err(LedgerError::AccountClosed {
                account_number: self.account_number.clone(),
            });
        }
        if self.is_locked {
            return Err(LedgerError::AccountLocked {
                account_number: self.account_number.clone(),
            });
        }
        Ok(())
    }

    /// Check the `below_maintaining_since` / status invariant.
    #[must_use]
    pub fn lifecycle_dates_consistent(&self) -> bool {
        match self.status {
            AccountStatus::Active => self.below_maintaining_since.is_none(),
            AccountStatus::BelowMaintaining | AccountStatus::FlaggedForRemoval => {
                self.below_maintaining_since.is_some()
            }
            AccountStatus::Closed => true,
        }
    }
}

/// Fields needed to open an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAccount {
    /// Unique account number.
    pub account_number: String,
    /// Owning customer.
    pub customer_id: CustomerId,
    /// Product name.
    pub account_type: String,
    /// Maintaining balance requirement in cents.
    pub maintaining_balance_cents: i64,
    /// Fee per interval in cents.
    pub monthly_fee_cents: i64,
}

/// Lifecycle status of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    /// Balance at or above the maintaining requirement.
    Active,

    /// Balance under the requirement; fees apply.
    BelowMaintaining,

    /// Pre-closure warning; closes automatically unless the account recovers.
    FlaggedForRemoval,

    /// Terminal.
    Closed,
}

impl AccountStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 4] = [
        Self::Active,
        Self::BelowMaintaining,
        Self::FlaggedForRemoval,
        Self::Closed,
    ];

    /// The value stored in the `status` column.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::BelowMaintaining => "below_maintaining",
            Self::FlaggedForRemoval => "flagged_for_removal",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountStatus {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| LedgerError::Storage(format!("unknown account status: {s}")))
    }
}
