//! Fee scheduler: charge the maintenance or service fee when it is due.

use chrono::{DateTime, Utc};
use tracing::debug;

use ledger_core::fees::decide;
use ledger_core::{
    format_cents, Account, Actor, FeeCharge, FeeDecision, NewFeeCharge, Result,
};
use ledger_store::UnitOfWork;

use crate::balance::current_balance;
use crate::recorder::Posting;
use crate::Engine;

impl Engine {
    /// Charge the fee for a locked account if one is due.
    ///
    /// On a charge, records the debit, writes the audit row and stamps
    /// `last_service_fee_date`. Returns the audit row, or `None` when nothing
    /// was charged. The caller re-evaluates the lifecycle afterwards.
    pub(crate) async fn charge_fee_if_due(
        &self,
        uow: &mut dyn UnitOfWork,
        account: &mut Account,
        balance_cents: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<FeeCharge>> {
        let today = now.date_naive();
        let last_charge = uow.last_fee_charge_date(account.id).await?;

        let due = match decide(account, balance_cents, last_charge, today, &self.policy) {
            FeeDecision::Due(due) => due,
            decision => {
                debug!(account_id = %account.id, ?decision, "No fee charged");
                return Ok(None);
            }
        };

        let transaction_type = due.category.transaction_type();
        let description = format!(
            "{transaction_type} for {}",
            today.format("%B %Y")
        );
        let transaction = self
            .recorder()
            .record(
                uow,
                Posting::new(account, transaction_type, due.amount_cents, description),
                Actor::System,
                now,
            )
            .await?;

        let balance_after = current_balance(uow, &self.policy.catalog, account.id).await?;
        let charge = uow
            .insert_fee_charge(&NewFeeCharge {
                account_id: account.id,
                transaction_id: transaction.id,
                balance_before_cents: balance_cents,
                balance_after_cents: balance_after,
                charge_date: today,
                fee_category: due.category,
            })
            .await?;

        account.last_service_fee_date = Some(today);
        account.updated_at = now;
        uow.update_account(account).await?;

        debug!(
            account_id = %account.id,
            category = due.category.as_str(),
            amount = %format_cents(due.amount_cents),
            balance_after = %format_cents(balance_after),
            "Fee charged"
        );
        Ok(Some(charge))
    }
}
