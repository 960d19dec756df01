//! Balance calculation and reconciliation.

use serde::Serialize;
use tracing::{debug, warn};

use ledger_core::{AccountId, Result, TypeCatalog};
use ledger_store::UnitOfWork;

use crate::{finish, not_found, Engine};

/// Current balance of `account_id` as seen by `uow`, in cents.
///
/// Folds the store's per-type totals through `catalog`. Accounts without
/// transactions have a balance of 0. Call after locking the account so the
/// result cannot go stale before the caller's writes.
///
/// # Errors
///
/// Returns an error if the totals cannot be read.
pub async fn current_balance(
    uow: &mut dyn UnitOfWork,
    catalog: &TypeCatalog,
    account_id: AccountId,
) -> Result<i64> {
    let totals = uow.type_totals(account_id).await?;
    Ok(catalog.balance_from_totals(
        totals
            .iter()
            .map(|t| (t.transaction_type.as_str(), t.total_cents)),
    ))
}

/// Result of comparing the aggregate balance with a row-by-row fold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reconciliation {
    /// Account checked.
    pub account_id: AccountId,
    /// Account number checked.
    pub account_number: String,
    /// Balance from the per-type aggregate.
    pub aggregate_balance_cents: i64,
    /// Balance from folding every row.
    pub folded_balance_cents: i64,
    /// Rows folded.
    pub transaction_count: usize,
    /// Stored type names the catalog does not know; they count as 0.
    pub unknown_types: Vec<String>,
    /// Whether both computations agree.
    pub balanced: bool,
}

impl Engine {
    /// Recompute an account's balance two ways and compare them.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::AccountNotFound` for an unknown account number.
    pub async fn reconcile(&self, account_number: &str) -> Result<Reconciliation> {
        let mut uow = self.store.begin().await?;
        let result = self.reconcile_in(uow.as_mut(), account_number).await;
        finish(uow, result).await
    }

    async fn reconcile_in(
        &self,
        uow: &mut dyn UnitOfWork,
        account_number: &str,
    ) -> Result<Reconciliation> {
        let account = uow
            .lock_account_by_number(account_number)
            .await?
            .ok_or_else(|| not_found(account_number))?;

        let catalog = &self.policy.catalog;
        let aggregate = current_balance(uow, catalog, account.id).await?;
        let rows = uow.ledger(account.id).await?;
        let folded = catalog.balance_of(&rows);

        let mut unknown_types: Vec<String> = rows
            .iter()
            .filter(|tx| catalog.sign_of(&tx.transaction_type).is_none())
            .map(|tx| tx.transaction_type.clone())
            .collect();
        unknown_types.sort();
        unknown_types.dedup();

        let balanced = aggregate == folded;
        if balanced {
            debug!(account_id = %account.id, balance = aggregate, "Ledger reconciled");
        } else {
            warn!(
                account_id = %account.id,
                aggregate,
                folded,
                "Ledger aggregate disagrees with row fold"
            );
        }

        Ok(Reconciliation {
            account_id: account.id,
            account_number: account.account_number,
            aggregate_balance_cents: aggregate,
            folded_balance_cents: folded,
            transaction_count: rows.len(),
            unknown_types,
            balanced,
        })
    }
}
