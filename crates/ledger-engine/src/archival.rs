//! Archival: snapshot an account, then close and lock it.

use chrono::{DateTime, Utc};
use tracing::info;

use ledger_core::{
    Account, AccountStatus, ArchivedAccount, LedgerError, Lifecycle, Result, Transition,
};
use ledger_store::UnitOfWork;

use crate::balance::current_balance;
use crate::{finish, not_found, Engine};

impl Engine {
    /// Archive an account by number.
    ///
    /// Locks the row, computes the final balance, writes the snapshot and
    /// closes the account, all in one unit of work.
    ///
    /// # Errors
    ///
    /// - `LedgerError::AccountNotFound` for an unknown account number
    /// - `LedgerError::AlreadyClosed` if the account is already closed
    pub async fn archive(&self, account_number: &str) -> Result<ArchivedAccount> {
        let now = self.now();
        let mut uow = self.store.begin().await?;
        let result = async {
            let uow = uow.as_mut();
            let mut account = uow
                .lock_account_by_number(account_number)
                .await?
                .ok_or_else(|| not_found(account_number))?;
            let balance = current_balance(uow, &self.policy.catalog, account.id).await?;
            self.archive_locked(uow, &mut account, balance, now).await
        }
        .await;
        finish(uow, result).await
    }

    /// Snapshot a locked account with `final_balance_cents`, then close it.
    pub(crate) async fn archive_locked(
        &self,
        uow: &mut dyn UnitOfWork,
        account: &mut Account,
        final_balance_cents: i64,
        now: DateTime<Utc>,
    ) -> Result<ArchivedAccount> {
        if account.status == AccountStatus::Closed {
            return Err(LedgerError::AlreadyClosed {
                account_number: account.account_number.clone(),
            });
        }

        let snapshot = ArchivedAccount::snapshot(
            account,
            final_balance_cents,
            self.policy.archive_reason.clone(),
            now,
        );
        uow.insert_archive(&snapshot).await?;

        Lifecycle::new(&self.policy).apply(account, Transition::Archived, now.date_naive());
        account.updated_at = now;
        uow.update_account(account).await?;

        info!(
            account_id = %account.id,
            account_number = %account.account_number,
            final_balance_cents,
            reason = %snapshot.archive_reason,
            "Account archived"
        );
        Ok(snapshot)
    }
}
