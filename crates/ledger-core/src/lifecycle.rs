//! Maintaining-balance lifecycle state machine.
//!
//! ```text
//! active ──(balance under threshold)──▶ below_maintaining
//!    ▲                                        │
//!    └────────────(recovered)─────────────────┤
//!    ▲                                        ▼
//!    └──(recovered)── flagged_for_removal ◀──(N months, or fee took balance to 0)
//!                          │
//!                          ▼ (warning expired)         (M months below) ──▶ archived + closed
//!                        closed
//! ```
//!
//! Evaluation is a pure function of the account row, a freshly computed
//! balance and today's date. Recovery is checked before any escalation, so
//! an account that has just been topped up never gets flagged or closed in
//! the same pass.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar::{days_between, months_between};
use crate::{Account, AccountStatus, LedgerPolicy};

/// What prompted an evaluation. Decides which escalations may fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    /// A teller or customer operation just changed the balance.
    Mutation,
    /// Nightly run, before any fee is charged.
    Scheduled,
    /// Nightly run, right after a fee was charged.
    AfterFee,
    /// Statistics refresh.
    Reporting,
}

impl Trigger {
    const fn escalates(self) -> bool {
        !matches!(self, Self::Mutation)
    }
}

/// Why an account was flagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagReason {
    /// Below maintaining for the configured number of months.
    ProlongedShortfall,
    /// A fee charge brought the balance to zero.
    DepletedByFee,
}

/// Outcome of one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "transition", rename_all = "snake_case")]
pub enum Transition {
    /// Nothing to do.
    Unchanged,
    /// Locked or closed; not evaluated.
    Frozen,
    /// active → `below_maintaining`.
    FellBelowMaintaining,
    /// `below_maintaining` / flagged → active.
    Recovered,
    /// `below_maintaining` → `flagged_for_removal`.
    Flagged {
        /// Why.
        reason: FlagReason,
    },
    /// flagged → closed after the warning period.
    Closed,
    /// Below maintaining too long; snapshot then close.
    Archived,
}

impl Transition {
    /// Whether applying this transition changes the account row.
    #[must_use]
    pub const fn is_change(&self) -> bool {
        !matches!(self, Self::Unchanged | Self::Frozen)
    }

    /// Whether this transition ends the account's life.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed | Self::Archived)
    }
}

/// The state machine, parameterised by policy.
#[derive(Debug, Clone)]
pub struct Lifecycle<'a> {
    policy: &'a LedgerPolicy,
}

impl<'a> Lifecycle<'a> {
    /// Build a state machine over `policy`.
    #[must_use]
    pub const fn new(policy: &'a LedgerPolicy) -> Self {
        Self { policy }
    }

    /// Decide the transition for `account` at `balance_cents` on `today`.
    #[must_use]
    pub fn evaluate(
        &self,
        account: &Account,
        balance_cents: i64,
        today: NaiveDate,
        trigger: Trigger,
    ) -> Transition {
        if account.is_frozen() {
            return Transition::Frozen;
        }

        let below = account.is_below_maintaining(balance_cents);

        match account.status {
            AccountStatus::Active => {
                if below {
                    Transition::FellBelowMaintaining
                } else {
                    Transition::Unchanged
                }
            }
            AccountStatus::BelowMaintaining | AccountStatus::FlaggedForRemoval if !below => {
                Transition::Recovered
            }
            AccountStatus::BelowMaintaining | AccountStatus::FlaggedForRemoval
                if !trigger.escalates() =>
            {
                Transition::Unchanged
            }
            AccountStatus::BelowMaintaining => {
                let months = Self::months_below(account, today);
                if months >= self.policy.archive_after_months {
                    Transition::Archived
                } else if months >= self.policy.flag_after_months {
                    Transition::Flagged {
                        reason: FlagReason::ProlongedShortfall,
                    }
                } else if trigger == Trigger::AfterFee && balance_cents <= 0 {
                    Transition::Flagged {
                        reason: FlagReason::DepletedByFee,
                    }
                } else {
                    Transition::Unchanged
                }
            }
            AccountStatus::FlaggedForRemoval => {
                if Self::months_below(account, today) >= self.policy.archive_after_months {
                    Transition::Archived
                } else if self.warning_expired(account, today) {
                    Transition::Closed
                } else {
                    Transition::Unchanged
                }
            }
            AccountStatus::Closed => Transition::Frozen,
        }
    }

    /// Apply the date and status side effects of `transition` to `account`.
    ///
    /// Archival snapshots are written by the caller before this is applied.
    pub fn apply(&self, account: &mut Account, transition: Transition, today: NaiveDate) {
        match transition {
            Transition::Unchanged | Transition::Frozen => {}
            Transition::FellBelowMaintaining => {
                account.status = AccountStatus::BelowMaintaining;
                account.below_maintaining_since = Some(today);
            }
            Transition::Recovered => {
                account.status = AccountStatus::Active;
                account.below_maintaining_since = None;
                account.closure_warning_date = None;
            }
            Transition::Flagged { .. } => {
                account.status = AccountStatus::FlaggedForRemoval;
                account.closure_warning_date = Some(today);
                account.below_maintaining_since.get_or_insert(today);
            }
            Transition::Closed | Transition::Archived => {
                account.status = AccountStatus::Closed;
                account.is_locked = true;
                account.closure_date = Some(today);
            }
        }
    }

    fn months_below(account: &Account, today: NaiveDate) -> i32 {
        account
            .below_maintaining_since
            .map_or(0, |since| months_between(since, today))
    }

    fn warning_expired(&self, account: &Account, today: NaiveDate) -> bool {
        account
            .closure_warning_date
            .is_some_and(|warned| days_between(warned, today) >= self.policy.closure_warning_days)
    }
}
