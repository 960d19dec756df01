//! Storage layer for the account ledger.
//!
//! This crate provides persistent storage for accounts, the append-only
//! transaction ledger, fee-charge audit rows and archive snapshots.
//!
//! # Units of work
//!
//! Every mutation happens inside a [`UnitOfWork`] obtained from
//! [`Store::begin`]. A unit of work is one database transaction: the caller
//! locks the account row first ([`UnitOfWork::lock_account`], `SELECT … FOR
//! UPDATE` on PostgreSQL), computes the balance under that lock, writes, and
//! then commits. Dropping a unit of work without committing rolls it back.
//!
//! # Backends
//!
//! - [`PgStore`]: PostgreSQL via `sqlx`.
//! - [`MemoryStore`]: in-process, serialises units of work behind one mutex.
//!   Used by tests and for local development without a database.
//!
//! # Example
//!
//! ```no_run
//! use ledger_store::{MemoryStore, Store};
//!
//! # async fn demo() -> ledger_store::Result<()> {
//! let store = MemoryStore::new();
//! let mut uow = store.begin().await?;
//! let account = uow.lock_account(ledger_core::AccountId::new(1)).await?;
//! uow.commit().await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod memory;
pub mod postgres;
pub mod schema;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use ledger_core::{
    Account, AccountId, ArchivedAccount, FeeCharge, NewAccount, NewFeeCharge, NewTransaction,
    Transaction, TypeTotal,
};

/// Which accounts a listing returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountScope {
    /// Every account, including closed ones.
    All,
    /// Accounts batch jobs should visit: not closed and not locked.
    Open,
}

/// The storage trait defining all non-transactional operations and the
/// entry point for units of work.
#[async_trait]
pub trait Store: Send + Sync {
    /// Start a unit of work.
    ///
    /// # Errors
    ///
    /// Returns an error if a database transaction cannot be started.
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>>;

    // =========================================================================
    // Account Operations
    // =========================================================================

    /// Insert a new account with status `active`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Duplicate` if the account number is taken.
    async fn create_account(&self, account: &NewAccount, now: DateTime<Utc>) -> Result<Account>;

    /// Get an account by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn get_account(&self, id: AccountId) -> Result<Option<Account>>;

    /// Get an account by account number.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn find_account_by_number(&self, account_number: &str) -> Result<Option<Account>>;

    /// List accounts ordered by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn list_accounts(&self, scope: AccountScope) -> Result<Vec<Account>>;

    // =========================================================================
    // Ledger Reads
    // =========================================================================

    /// List transactions for an account, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn list_transactions(
        &self,
        account_id: AccountId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Transaction>>;

    /// List fee-charge audit rows for an account, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn list_fee_charges(&self, account_id: AccountId) -> Result<Vec<FeeCharge>>;

    /// Get the archive snapshot of an account.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn get_archive(&self, account_id: AccountId) -> Result<Option<ArchivedAccount>>;
}

/// One database transaction.
///
/// Dropping without [`UnitOfWork::commit`] discards every write.
#[async_trait]
pub trait UnitOfWork: Send {
    /// Load an account and hold an exclusive lock on its row until commit or
    /// rollback.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Conflict` if the lock cannot be acquired in time.
    async fn lock_account(&mut self, id: AccountId) -> Result<Option<Account>>;

    /// [`UnitOfWork::lock_account`] by account number.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Conflict` if the lock cannot be acquired in time.
    async fn lock_account_by_number(&mut self, account_number: &str) -> Result<Option<Account>>;

    /// Sum of `amount_cents` per transaction type name for one account.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn type_totals(&mut self, account_id: AccountId) -> Result<Vec<TypeTotal>>;

    /// Every ledger row of an account, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn ledger(&mut self, account_id: AccountId) -> Result<Vec<Transaction>>;

    /// Append one ledger row.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn insert_transaction(&mut self, transaction: &NewTransaction) -> Result<Transaction>;

    /// Persist the lifecycle fields of a locked account (status, lock flag,
    /// dates, `updated_at`).
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the account doesn't exist.
    async fn update_account(&mut self, account: &Account) -> Result<()>;

    /// Date of the most recent fee-charge audit row.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn last_fee_charge_date(&mut self, account_id: AccountId) -> Result<Option<NaiveDate>>;

    /// Write a fee-charge audit row.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn insert_fee_charge(&mut self, charge: &NewFeeCharge) -> Result<FeeCharge>;

    /// Write an archive snapshot.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Duplicate` if the account was already archived.
    async fn insert_archive(&mut self, archive: &ArchivedAccount) -> Result<()>;

    /// Make every write visible and release locks.
    ///
    /// # Errors
    ///
    /// Returns an error if the commit fails; nothing is applied in that case.
    async fn commit(self: Box<Self>) -> Result<()>;

    /// Discard every write and release locks.
    ///
    /// # Errors
    ///
    /// Returns an error if the rollback itself fails.
    async fn rollback(self: Box<Self>) -> Result<()>;
}
