//! Read-only account inquiry.

use serde::Serialize;

use ledger_core::{Account, LedgerError, Result};

use crate::balance::current_balance;
use crate::warnings::{maintaining_warnings, Warning};
use crate::{finish, not_found, Engine};

/// An account with its computed balance.
#[derive(Debug, Clone, Serialize)]
pub struct AccountOverview {
    /// The account row.
    pub account: Account,
    /// Balance computed from the ledger, in cents.
    pub balance_cents: i64,
    /// Maintaining-balance warnings.
    pub warnings: Vec<Warning>,
}

impl Engine {
    /// Load an account and compute its balance in a consistent snapshot.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::AccountNotFound` for an unknown account number.
    pub async fn account_overview(&self, account_number: &str) -> Result<AccountOverview> {
        let mut uow = self.store.begin().await?;
        let result = async {
            let uow = uow.as_mut();
            let account = uow
                .lock_account_by_number(account_number)
                .await?
                .ok_or_else(|| not_found(account_number))?;
            let balance_cents = current_balance(uow, &self.policy.catalog, account.id).await?;
            Ok::<_, LedgerError>(AccountOverview {
                warnings: maintaining_warnings(&account, balance_cents),
                account,
                balance_cents,
            })
        }
        .await;
        finish(uow, result).await
    }
}
