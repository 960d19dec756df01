//! Ledger orchestration.
//!
//! The [`Engine`] composes the pure rules from `ledger-core` with a
//! [`Store`](ledger_store::Store) into the operations the outside world
//! calls:
//!
//! - **Teller**: [`Engine::withdraw`], [`Engine::deposit`]
//! - **Transfers**: [`Engine::transfer`]
//! - **Batches**: [`Engine::run_nightly`], [`Engine::refresh_statistics`]
//! - **Lifecycle**: [`Engine::archive`], [`Engine::process_account`]
//! - **Reads**: [`Engine::account_overview`], [`Engine::reconcile`]
//!
//! # Units of work
//!
//! Every operation that writes opens exactly one unit of work per account
//! (one for both accounts of an internal transfer), locks the account row
//! first, computes the balance under that lock and commits or rolls back as a
//! whole. Batches never share a unit of work between accounts.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod archival;
pub mod balance;
pub mod fees;
pub mod inquiry;
pub mod lifecycle;
pub mod nightly;
pub mod recorder;
pub mod statistics;
pub mod teller;
pub mod transfer;
pub mod warnings;

pub use balance::{current_balance, Reconciliation};
pub use inquiry::AccountOverview;
pub use nightly::{AccountOutcome, NightlyReport};
pub use recorder::{Posting, TransactionRecorder};
pub use statistics::{AccountSummary, StatusCounts, Statistics};
pub use teller::Receipt;
pub use transfer::{TransferClass, TransferDestination, TransferReceipt, TransferRequest};
pub use warnings::{Warning, WarningCode};

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::warn;

use ledger_core::{Account, Clock, LedgerError, LedgerPolicy, Result};
use ledger_store::{Store, UnitOfWork};

/// Ledger operations over a store, a clock and a policy.
#[derive(Clone)]
pub struct Engine {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    policy: Arc<LedgerPolicy>,
}

impl Engine {
    /// Build an engine.
    ///
    /// The policy is not validated here; [`Engine::run_nightly`] refuses to
    /// start with a catalog that is missing an engine-written type.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>, policy: LedgerPolicy) -> Self {
        Self {
            store,
            clock,
            policy: Arc::new(policy),
        }
    }

    /// The backing store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// The active policy.
    #[must_use]
    pub fn policy(&self) -> &LedgerPolicy {
        &self.policy
    }

    /// The engine's notion of "now".
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// The engine's notion of "today".
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// The transaction recorder bound to this engine's catalog.
    #[must_use]
    pub fn recorder(&self) -> TransactionRecorder<'_> {
        TransactionRecorder::new(&self.policy.catalog)
    }

    /// Look up an account by number without locking it.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::AccountNotFound` if no such account exists.
    pub async fn find_account(&self, account_number: &str) -> Result<Account> {
        self.store
            .find_account_by_number(account_number)
            .await?
            .ok_or_else(|| not_found(account_number))
    }
}

pub(crate) fn not_found(account: impl ToString) -> LedgerError {
    LedgerError::AccountNotFound {
        account: account.to_string(),
    }
}

/// Commit `uow` if `result` is `Ok`, otherwise roll it back and return the
/// original error.
pub(crate) async fn finish<T>(uow: Box<dyn UnitOfWork>, result: Result<T>) -> Result<T> {
    match result {
        Ok(value) => {
            uow.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = uow.rollback().await {
                warn!(error = %rollback_err, "Rollback failed");
            }
            Err(err)
        }
    }
}
