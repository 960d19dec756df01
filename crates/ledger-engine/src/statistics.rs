//! Statistics refresh.
//!
//! Re-evaluates the lifecycle of every open account (`Reporting` trigger)
//! before reporting, so the counts reflect today's statuses. Each account is
//! evaluated in its own unit of work.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::{error, info, warn};

use ledger_core::{
    AccountId, AccountStatus, CustomerId, Result, Transition, Trigger,
};
use ledger_store::{AccountScope, UnitOfWork};

use crate::balance::current_balance;
use crate::{finish, not_found, Engine};

/// One row of the per-account list.
#[derive(Debug, Clone, Serialize)]
pub struct AccountSummary {
    /// Account id.
    pub account_id: AccountId,
    /// Account number.
    pub account_number: String,
    /// Owner.
    pub customer_id: CustomerId,
    /// Product name.
    pub account_type: String,
    /// Status after refresh.
    pub status: AccountStatus,
    /// Lock flag.
    pub is_locked: bool,
    /// Balance computed on demand, in cents.
    pub balance_cents: i64,
    /// Maintaining requirement, in cents.
    pub maintaining_balance_cents: i64,
    /// Start of the current shortfall.
    pub below_maintaining_since: Option<NaiveDate>,
    /// When the closure warning was issued.
    pub closure_warning_date: Option<NaiveDate>,
}

/// Accounts per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    /// `active`.
    pub active: usize,
    /// `below_maintaining`.
    pub below_maintaining: usize,
    /// `flagged_for_removal`.
    pub flagged_for_removal: usize,
    /// `closed`.
    pub closed: usize,
}

impl StatusCounts {
    fn add(&mut self, status: AccountStatus) {
        match status {
            AccountStatus::Active => self.active += 1,
            AccountStatus::BelowMaintaining => self.below_maintaining += 1,
            AccountStatus::FlaggedForRemoval => self.flagged_for_removal += 1,
            AccountStatus::Closed => self.closed += 1,
        }
    }
}

/// Aggregate view of every account.
#[derive(Debug, Clone, Serialize)]
pub struct Statistics {
    /// When the refresh ran.
    pub generated_at: DateTime<Utc>,
    /// Accounts listed.
    pub total_accounts: usize,
    /// Accounts per status.
    pub by_status: StatusCounts,
    /// Locked accounts (closed accounts are always locked).
    pub locked_accounts: usize,
    /// Sum of listed balances, in cents.
    pub total_balance_cents: i64,
    /// Status changes applied by this refresh.
    pub transitions_applied: usize,
    /// Accounts that could not be refreshed and are missing from the list.
    pub failures: usize,
    /// Per-account rows, ordered by id.
    pub accounts: Vec<AccountSummary>,
}

impl Engine {
    /// Refresh lifecycle statuses and build the statistics report.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the account list cannot be read, or
    /// `LedgerError::Configuration` if an account hits a configuration error.
    pub async fn refresh_statistics(&self) -> Result<Statistics> {
        let now = self.now();
        let accounts = self.store.list_accounts(AccountScope::All).await?;

        let mut stats = Statistics {
            generated_at: now,
            total_accounts: 0,
            by_status: StatusCounts::default(),
            locked_accounts: 0,
            total_balance_cents: 0,
            transitions_applied: 0,
            failures: 0,
            accounts: Vec::with_capacity(accounts.len()),
        };

        for account in accounts {
            let mut uow = self.store.begin().await?;
            let result = self.refresh_locked(uow.as_mut(), account.id, now).await;
            match finish(uow, result).await {
                Ok((summary, transition)) => {
                    if transition.is_change() {
                        stats.transitions_applied += 1;
                    }
                    stats.total_accounts += 1;
                    stats.by_status.add(summary.status);
                    if summary.is_locked {
                        stats.locked_accounts += 1;
                    }
                    stats.total_balance_cents =
                        stats.total_balance_cents.saturating_add(summary.balance_cents);
                    stats.accounts.push(summary);
                }
                Err(err) if err.is_fatal() => {
                    error!(account_id = %account.id, error = %err, "Statistics refresh aborted");
                    return Err(err);
                }
                Err(err) => {
                    warn!(account_id = %account.id, error = %err, "Statistics refresh failed for account");
                    stats.failures += 1;
                }
            }
        }

        info!(
            total_accounts = stats.total_accounts,
            transitions_applied = stats.transitions_applied,
            failures = stats.failures,
            "Statistics refreshed"
        );
        Ok(stats)
    }

    async fn refresh_locked(
        &self,
        uow: &mut dyn UnitOfWork,
        account_id: AccountId,
        now: DateTime<Utc>,
    ) -> Result<(AccountSummary, Transition)> {
        let mut account = uow
            .lock_account(account_id)
            .await?
            .ok_or_else(|| not_found(account_id))?;
        let balance = current_balance(uow, &self.policy.catalog, account.id).await?;
        let transition = self
            .settle(uow, &mut account, balance, Trigger::Reporting, now)
            .await?;

        let summary = AccountSummary {
            account_id: account.id,
            account_number: account.account_number,
            customer_id: account.customer_id,
            account_type: account.account_type,
            status: account.status,
            is_locked: account.is_locked,
            balance_cents: balance,
            maintaining_balance_cents: account.maintaining_balance_cents,
            below_maintaining_since: account.below_maintaining_since,
            closure_warning_date: account.closure_warning_date,
        };
        Ok((summary, transition))
    }
}
