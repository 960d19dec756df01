//! In-memory storage implementation.
//!
//! Units of work take an exclusive lock on the whole store and operate on a
//! private copy of it; commit swaps the copy in, drop throws it away. That is
//! stricter than row locking but gives the same guarantees the engine relies
//! on: no unit of work observes another's uncommitted writes, and a failed
//! unit of work leaves no trace.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};

use ledger_core::{
    Account, AccountId, AccountStatus, ArchivedAccount, FeeCharge, FeeChargeId, NewAccount,
    NewFeeCharge, NewTransaction, Transaction, TransactionId, TypeTotal,
};

use crate::error::{Result, StoreError};
use crate::{AccountScope, Store, UnitOfWork};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    accounts: BTreeMap<AccountId, Account>,
    transactions: Vec<Transaction>,
    fee_charges: Vec<FeeCharge>,
    archives: BTreeMap<AccountId, ArchivedAccount>,
    next_account_id: i64,
    next_transaction_id: i64,
    next_fee_charge_id: i64,
    failing_accounts: BTreeSet<AccountId>,
}

impl MemoryState {
    fn account_by_number(&self, account_number: &str) -> Option<&Account> {
        self.accounts
            .values()
            .find(|a| a.account_number == account_number)
    }

    fn check_failure(&self, id: AccountId) -> Result<()> {
        if self.failing_accounts.contains(&id) {
            return Err(StoreError::Conflict(format!(
                "injected lock failure for account {id}"
            )));
        }
        Ok(())
    }
}

/// In-process store for tests and local development.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every attempt to lock `id` fail with a conflict.
    pub async fn fail_locks_for(&self, id: AccountId) {
        self.state.lock().await.failing_accounts.insert(id);
    }

    /// Undo [`MemoryStore::fail_locks_for`].
    pub async fn clear_lock_failures(&self) {
        self.state.lock().await.failing_accounts.clear();
    }

    /// Count every ledger row across all accounts.
    pub async fn transaction_count(&self) -> usize {
        self.state.lock().await.transactions.len()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let work = guard.clone();
        Ok(Box::new(MemoryUnitOfWork { guard, work }))
    }

    async fn create_account(&self, account: &NewAccount, now: DateTime<Utc>) -> Result<Account> {
        let mut state = self.state.lock().await;
        if state.account_by_number(&account.account_number).is_some() {
            return Err(StoreError::Duplicate(format!(
                "account number {} already exists",
                account.account_number
            )));
        }

        state.next_account_id += 1;
        let created = Account {
            id: AccountId::new(state.next_account_id),
            account_number: account.account_number.clone(),
            customer_id: account.customer_id,
            account_type: account.account_type.clone(),
            maintaining_balance_cents: account.maintaining_balance_cents,
            monthly_fee_cents: account.monthly_fee_cents,
            is_locked: false,
            status: AccountStatus::Active,
            below_maintaining_since: None,
            last_service_fee_date: None,
            closure_warning_date: None,
            closure_date: None,
            created_at: now,
            updated_at: now,
        };
        state.accounts.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get_account(&self, id: AccountId) -> Result<Option<Account>> {
        Ok(self.state.lock().await.accounts.get(&id).cloned())
    }

    async fn find_account_by_number(&self, account_number: &str) -> Result<Option<Account>> {
        Ok(self
            .state
            .lock()
            .await
            .account_by_number(account_number)
            .cloned())
    }

    async fn list_accounts(&self, scope: AccountScope) -> Result<Vec<Account>> {
        let state = self.state.lock().await;
        Ok(state
            .accounts
            .values()
            .filter(|a| match scope {
                AccountScope::All => true,
                AccountScope::Open => !a.is_frozen(),
            })
            .cloned()
            .collect())
    }

    async fn list_transactions(
        &self,
        account_id: AccountId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Transaction>> {
        let state = self.state.lock().await;
        Ok(state
            .transactions
            .iter()
            .rev()
            .filter(|tx| tx.account_id == account_id)
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn list_fee_charges(&self, account_id: AccountId) -> Result<Vec<FeeCharge>> {
        let state = self.state.lock().await;
        Ok(state
            .fee_charges
            .iter()
            .rev()
            .filter(|c| c.account_id == account_id)
            .cloned()
            .collect())
    }

    async fn get_archive(&self, account_id: AccountId) -> Result<Option<ArchivedAccount>> {
        Ok(self.state.lock().await.archives.get(&account_id).cloned())
    }
}

/// A unit of work over [`MemoryStore`].
pub struct MemoryUnitOfWork {
    guard: OwnedMutexGuard<MemoryState>,
    work: MemoryState,
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn lock_account(&mut self, id: AccountId) -> Result<Option<Account>> {
        self.work.check_failure(id)?;
        Ok(self.work.accounts.get(&id).cloned())
    }

    async fn lock_account_by_number(&mut self, account_number: &str) -> Result<Option<Account>> {
        let Some(account) = self.work.account_by_number(account_number).cloned() else {
            return Ok(None);
        };
        self.work.check_failure(account.id)?;
        Ok(Some(account))
    }

    async fn type_totals(&mut self, account_id: AccountId) -> Result<Vec<TypeTotal>> {
        let mut totals: BTreeMap<&str, i64> = BTreeMap::new();
        for tx in self.work.transactions.iter().filter(|tx| tx.account_id == account_id) {
            *totals.entry(tx.transaction_type.as_str()).or_default() += tx.amount_cents;
        }
        Ok(totals
            .into_iter()
            .map(|(name, total_cents)| TypeTotal {
                transaction_type: name.to_string(),
                total_cents,
            })
            .collect())
    }

    async fn ledger(&mut self, account_id: AccountId) -> Result<Vec<Transaction>> {
        Ok(self
            .work
            .transactions
            .iter()
            .filter(|tx| tx.account_id == account_id)
            .cloned()
            .collect())
    }

    async fn insert_transaction(&mut self, transaction: &NewTransaction) -> Result<Transaction> {
        if !self.work.accounts.contains_key(&transaction.account_id) {
            return Err(StoreError::NotFound {
                entity: "account",
                id: transaction.account_id.to_string(),
            });
        }

        self.work.next_transaction_id += 1;
        let row = Transaction {
            id: TransactionId::new(self.work.next_transaction_id),
            reference: transaction.reference.clone(),
            account_id: transaction.account_id,
            related_account_id: transaction.related_account_id,
            transaction_type: transaction.transaction_type.as_str().to_string(),
            amount_cents: transaction.amount_cents,
            description: transaction.description.clone(),
            employee_id: transaction.employee_id,
            created_at: transaction.created_at,
        };
        self.work.transactions.push(row.clone());
        Ok(row)
    }

    async fn update_account(&mut self, account: &Account) -> Result<()> {
        let stored = self
            .work
            .accounts
            .get_mut(&account.id)
            .ok_or_else(|| StoreError::NotFound {
                entity: "account",
                id: account.id.to_string(),
            })?;

        stored.status = account.status;
        stored.is_locked = account.is_locked;
        stored.below_maintaining_since = account.below_maintaining_since;
        stored.last_service_fee_date = account.last_service_fee_date;
        stored.closure_warning_date = account.closure_warning_date;
        stored.closure_date = account.closure_date;
        stored.updated_at = account.updated_at;
        Ok(())
    }

    async fn last_fee_charge_date(&mut self, account_id: AccountId) -> Result<Option<NaiveDate>> {
        Ok(self
            .work
            .fee_charges
            .iter()
            .filter(|c| c.account_id == account_id)
            .map(|c| c.charge_date)
            .max())
    }

    async fn insert_fee_charge(&mut self, charge: &NewFeeCharge) -> Result<FeeCharge> {
        self.work.next_fee_charge_id += 1;
        let row = FeeCharge {
            id: FeeChargeId::new(self.work.next_fee_charge_id),
            account_id: charge.account_id,
            transaction_id: charge.transaction_id,
            balance_before_cents: charge.balance_before_cents,
            balance_after_cents: charge.balance_after_cents,
            charge_date: charge.charge_date,
            fee_category: charge.fee_category,
        };
        self.work.fee_charges.push(row.clone());
        Ok(row)
    }

    async fn insert_archive(&mut self, archive: &ArchivedAccount) -> Result<()> {
        if self.work.archives.contains_key(&archive.account_id) {
            return Err(StoreError::Duplicate(format!(
                "account {} already archived",
                archive.account_id
            )));
        }
        self.work.archives.insert(archive.account_id, archive.clone());
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let Self { mut guard, work } = *self;
        *guard = work;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}
