//! Maintenance/service fee rules.
//!
//! A fee is due at most once per fee interval. The decision uses the later of
//! the account's `last_service_fee_date` and the latest fee-charge audit row,
//! so a charge is never repeated even if one of the two was not updated.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::calendar::days_between;
use crate::{
    Account, AccountId, AccountStatus, FeeChargeId, LedgerPolicy, TransactionId, TransactionType,
};

/// Category written to the fee-charge audit row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeCategory {
    /// Monthly fee while below maintaining.
    Maintenance,
    /// Fee while flagged for removal.
    Service,
}

impl FeeCategory {
    /// The value stored in the `fee_category` column.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Maintenance => "maintenance",
            Self::Service => "service",
        }
    }

    /// Ledger type used for the fee debit.
    #[must_use]
    pub const fn transaction_type(&self) -> TransactionType {
        match self {
            Self::Maintenance => TransactionType::MonthlyMaintenanceFee,
            Self::Service => TransactionType::ServiceCharge,
        }
    }

    /// Parse the stored column value.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "maintenance" => Some(Self::Maintenance),
            "service" => Some(Self::Service),
            _ => None,
        }
    }
}

/// Why no fee applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ineligible {
    /// Status does not attract fees.
    Status,
    /// Account is locked.
    Locked,
    /// No fee configured.
    NoFeeConfigured,
    /// Nothing left to charge.
    EmptyBalance,
}

/// A fee that should be charged now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeDue {
    /// Audit category.
    pub category: FeeCategory,
    /// Amount to debit; never more than the balance.
    pub amount_cents: i64,
}

/// Outcome of a fee check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum FeeDecision {
    /// No fee applies to this account.
    NotEligible {
        /// Why.
        reason: Ineligible,
    },
    /// Already charged within the current interval.
    NotDue {
        /// First day the next fee may be charged.
        next_due: NaiveDate,
    },
    /// Charge now.
    Due(FeeDue),
}

/// Decide whether a fee is due for `account` at `balance_cents` on `today`.
///
/// `last_charge` is the date of the most recent fee-charge audit row, if any.
#[must_use]
pub fn decide(
    account: &Account,
    balance_cents: i64,
    last_charge: Option<NaiveDate>,
    today: NaiveDate,
    policy: &LedgerPolicy,
) -> FeeDecision {
    let category = match account.status {
        AccountStatus::BelowMaintaining => FeeCategory::Maintenance,
        AccountStatus::FlaggedForRemoval => FeeCategory::Service,
        AccountStatus::Active | AccountStatus::Closed => {
            return FeeDecision::NotEligible {
                reason: Ineligible::Status,
            }
        }
    };
    if account.is_locked {
        return FeeDecision::NotEligible {
            reason: Ineligible::Locked,
        };
    }
    if account.monthly_fee_cents <= 0 {
        return FeeDecision::NotEligible {
            reason: Ineligible::NoFeeConfigured,
        };
    }
    if balance_cents <= 0 {
        return FeeDecision::NotEligible {
            reason: Ineligible::EmptyBalance,
        };
    }

    let last = match (account.last_service_fee_date, last_charge) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    };
    if let Some(last) = last {
        if days_between(last, today) < policy.fee_interval_days {
            return FeeDecision::NotDue {
                next_due: last + Duration::days(policy.fee_interval_days),
            };
        }
    }

    FeeDecision::Due(FeeDue {
        category,
        amount_cents: account.monthly_fee_cents.min(balance_cents),
    })
}

/// Audit row written for every fee charged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeCharge {
    /// Surrogate key.
    pub id: FeeChargeId,
    /// Charged account.
    pub account_id: AccountId,
    /// Ledger row the charge produced.
    pub transaction_id: TransactionId,
    /// Balance just before the debit, in cents.
    pub balance_before_cents: i64,
    /// Balance just after the debit, in cents.
    pub balance_after_cents: i64,
    /// Day of the charge.
    pub charge_date: NaiveDate,
    /// Fee category.
    pub fee_category: FeeCategory,
}

/// A fee-charge audit row about to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFeeCharge {
    /// Charged account.
    pub account_id: AccountId,
    /// Ledger row the charge produced.
    pub transaction_id: TransactionId,
    /// Balance just before the debit, in cents.
    pub balance_before_cents: i64,
    /// Balance just after the debit, in cents.
    pub balance_after_cents: i64,
    /// Day of the charge.
    pub charge_date: NaiveDate,
    /// Fee category.
    pub fee_category: FeeCategory,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CustomerId;
    use chrono::Utc;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn below_account() -> Account {
        let now = Utc::now();
        Account {
            id: AccountId::new(4),
            account_number: "3001-0004".into(),
            customer_id: CustomerId::new(2),
            account_type: "savings".into(),
            maintaining_balance_cents: 50_000,
            monthly_fee_cents: 30_000,
            is_locked: false,
            status: AccountStatus::BelowMaintaining,
            below_maintaining_since: Some(d(2026, 9, 16)),
            last_service_fee_date: None,
            closure_warning_date: None,
            closure_date: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn never_charged_is_due() {
        let policy = LedgerPolicy::default();
        let decision = decide(&below_account(), 40_000, None, d(2026, 10, 16), &policy);
        assert_eq!(
            decision,
            FeeDecision::Due(FeeDue {
                category: FeeCategory::Maintenance,
                amount_cents: 30_000
            })
        );
    }

    #[test]
    fn interval_boundary() {
        let policy = LedgerPolicy::default();
        let mut acct = below_account();
        acct.last_service_fee_date = Some(d(2026, 9, 16));

        assert_eq!(
            decide(&acct, 40_000, None, d(2026, 10, 15), &policy),
            FeeDecision::NotDue {
                next_due: d(2026, 10, 16)
            }
        );
        assert!(matches!(
            decide(&acct, 40_000, None, d(2026, 10, 16), &policy),
            FeeDecision::Due(_)
        ));
    }

    #[test]
    fn audit_row_blocks_repeat_even_without_account_date() {
        let policy = LedgerPolicy::default();
        let acct = below_account();
        assert!(matches!(
            decide(&acct, 40_000, Some(d(2026, 10, 16)), d(2026, 10, 16), &policy),
            FeeDecision::NotDue { .. }
        ));
    }

    #[test]
    fn fee_capped_at_balance() {
        let policy = LedgerPolicy::default();
        let decision = decide(&below_account(), 12_000, None, d(2026, 10, 16), &policy);
        assert_eq!(
            decision,
            FeeDecision::Due(FeeDue {
                category: FeeCategory::Maintenance,
                amount_cents: 12_000
            })
        );
    }

    #[test]
    fn flagged_accounts_pay_service_charge() {
        let policy = LedgerPolicy::default();
        let mut acct = below_account();
        acct.status = AccountStatus::FlaggedForRemoval;
        let FeeDecision::Due(due) = decide(&acct, 100, None, d(2026, 10, 16), &policy) else {
            panic!("expected fee due");
        };
        assert_eq!(due.category, FeeCategory::Service);
        assert_eq!(due.category.transaction_type(), TransactionType::ServiceCharge);
    }

    #[test]
    fn ineligible_cases() {
        let policy = LedgerPolicy::default();
        let today = d(2026, 10, 16);

        let mut active = below_account();
        active.status = AccountStatus::Active;
        assert_eq!(
            decide(&active, 100, None, today, &policy),
            FeeDecision::NotEligible {
                reason: Ineligible::Status
            }
        );

        assert_eq!(
            decide(&below_account(), 0, None, today, &policy),
            FeeDecision::NotEligible {
                reason: Ineligible::EmptyBalance
            }
        );

        let mut free = below_account();
        free.monthly_fee_cents = 0;
        assert_eq!(
            decide(&free, 100, None, today, &policy),
            FeeDecision::NotEligible {
                reason: Ineligible::NoFeeConfigured
            }
        );
    }
}
