//! Applying lifecycle transitions to locked accounts.

use chrono::{DateTime, Utc};
use tracing::info;

use ledger_core::{Account, Lifecycle, Result, Transition, Trigger};
use ledger_store::UnitOfWork;

use crate::Engine;

impl Engine {
    /// Evaluate and persist the lifecycle transition for a locked account.
    ///
    /// An `Archived` outcome writes the snapshot before the account row is
    /// closed. Nothing is written for `Unchanged` or `Frozen`.
    pub(crate) async fn settle(
        &self,
        uow: &mut dyn UnitOfWork,
        account: &mut Account,
        balance_cents: i64,
        trigger: Trigger,
        now: DateTime<Utc>,
    ) -> Result<Transition> {
        let today = now.date_naive();
        let lifecycle = Lifecycle::new(&self.policy);
        let transition = lifecycle.evaluate(account, balance_cents, today, trigger);
        if !transition.is_change() {
            return Ok(transition);
        }

        if transition == Transition::Archived {
            self.archive_locked(uow, account, balance_cents, now).await?;
            return Ok(transition);
        }

        let from = account.status;
        lifecycle.apply(account, transition, today);
        account.updated_at = now;
        uow.update_account(account).await?;

        info!(
            account_id = %account.id,
            from = %from,
            to = %account.status,
            ?trigger,
            balance_cents,
            "Account status changed"
        );
        Ok(transition)
    }
}
