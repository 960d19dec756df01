//! PostgreSQL storage implementation.
//!
//! Every unit of work is one `sqlx` transaction. Account rows are locked with
//! `SELECT … FOR UPDATE` and the wait is bounded by `SET LOCAL lock_timeout`,
//! so a blocked request fails with a conflict instead of hanging.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, Row};
use tracing::{debug, info};

use ledger_core::{
    Account, AccountId, AccountStatus, ArchivedAccount, CustomerId, EmployeeId, FeeCategory,
    FeeCharge, FeeChargeId, NewAccount, NewFeeCharge, NewTransaction, Transaction, TransactionId,
    TypeTotal,
};

use crate::error::{Result, StoreError};
use crate::schema::{table, ACCOUNT_COLUMNS, ARCHIVE_COLUMNS, FEE_CHARGE_COLUMNS, TRANSACTION_COLUMNS};
use crate::{AccountScope, Store, UnitOfWork};

/// Default bound on row-lock waits, in milliseconds.
pub const DEFAULT_LOCK_TIMEOUT_MS: u64 = 5_000;

/// PostgreSQL-backed store.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
    lock_timeout_ms: u64,
}

impl PgStore {
    /// Connect to `database_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the pool cannot be created.
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        lock_timeout_ms: u64,
    ) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        info!(max_connections, lock_timeout_ms, "Connected to PostgreSQL");
        Ok(Self {
            pool,
            lock_timeout_ms,
        })
    }

    /// Wrap an existing pool.
    #[must_use]
    pub const fn from_pool(pool: PgPool, lock_timeout_ms: u64) -> Self {
        Self {
            pool,
            lock_timeout_ms,
        }
    }

    /// Apply pending migrations.
    ///
    /// # Errors
    ///
    /// Returns an error if a migration fails.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;
        info!("Migrations applied");
        Ok(())
    }

    /// The underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

// =============================================================================
// Row Decoding
// =============================================================================

fn account_from_row(row: &PgRow) -> Result<Account> {
    let status: String = row.try_get("status")?;
    Ok(Account {
        id: AccountId::new(row.try_get("id")?),
        account_number: row.try_get("account_number")?,
        customer_id: CustomerId::new(row.try_get("customer_id")?),
        account_type: row.try_get("account_type")?,
        maintaining_balance_cents: row.try_get("maintaining_balance_cents")?,
        monthly_fee_cents: row.try_get("monthly_fee_cents")?,
        is_locked: row.try_get("is_locked")?,
        status: AccountStatus::from_str(&status)?,
        below_maintaining_since: row.try_get("below_maintaining_since")?,
        last_service_fee_date: row.try_get("last_service_fee_date")?,
        closure_warning_date: row.try_get("closure_warning_date")?,
        closure_date: row.try_get("closure_date")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn transaction_from_row(row: &PgRow) -> Result<Transaction> {
    let related: Option<i64> = row.try_get("related_account_id")?;
    let employee: Option<i64> = row.try_get("employee_id")?;
    Ok(Transaction {
        id: TransactionId::new(row.try_get("id")?),
        reference: row.try_get("reference")?,
        account_id: AccountId::new(row.try_get("account_id")?),
        related_account_id: related.map(AccountId::new),
        transaction_type: row.try_get("transaction_type")?,
        amount_cents: row.try_get("amount_cents")?,
        description: row.try_get("description")?,
        employee_id: employee.map(EmployeeId::new),
        created_at: row.try_get("created_at")?,
    })
}

fn fee_charge_from_row(row: &PgRow) -> Result<FeeCharge> {
    let category: String = row.try_get("fee_category")?;
    let fee_category = FeeCategory::parse(&category)
        .ok_or_else(|| StoreError::Serialization(format!("unknown fee category: {category}")))?;
    Ok(FeeCharge {
        id: FeeChargeId::new(row.try_get("id")?),
        account_id: AccountId::new(row.try_get("account_id")?),
        transaction_id: TransactionId::new(row.try_get("transaction_id")?),
        balance_before_cents: row.try_get("balance_before_cents")?,
        balance_after_cents: row.try_get("balance_after_cents")?,
        charge_date: row.try_get("charge_date")?,
        fee_category,
    })
}

fn archive_from_row(row: &PgRow) -> Result<ArchivedAccount> {
    let status: String = row.try_get("status")?;
    Ok(ArchivedAccount {
        account_id: AccountId::new(row.try_get("account_id")?),
        account_number: row.try_get("account_number")?,
        customer_id: CustomerId::new(row.try_get("customer_id")?),
        account_type: row.try_get("account_type")?,
        maintaining_balance_cents: row.try_get("maintaining_balance_cents")?,
        monthly_fee_cents: row.try_get("monthly_fee_cents")?,
        status: AccountStatus::from_str(&status)?,
        was_locked: row.try_get("was_locked")?,
        below_maintaining_since: row.try_get("below_maintaining_since")?,
        last_service_fee_date: row.try_get("last_service_fee_date")?,
        closure_warning_date: row.try_get("closure_warning_date")?,
        opened_at: row.try_get("opened_at")?,
        final_balance_cents: row.try_get("final_balance_cents")?,
        archive_reason: row.try_get("archive_reason")?,
        archived_at: row.try_get("archived_at")?,
    })
}

fn to_i64(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[async_trait]
impl Store for PgStore {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>> {
        let mut tx = self.pool.begin().await?;
        // SET does not accept bind parameters.
        sqlx::query(&format!("SET LOCAL lock_timeout = {}", self.lock_timeout_ms))
            .execute(&mut *tx)
            .await?;
        Ok(Box::new(PgUnitOfWork { tx }))
    }

    async fn create_account(&self, account: &NewAccount, now: DateTime<Utc>) -> Result<Account> {
        let sql = format!(
            "INSERT INTO {} (account_number, customer_id, account_type, \
             maintaining_balance_cents, monthly_fee_cents, status, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, 'active', $6, $6) RETURNING {ACCOUNT_COLUMNS}",
            table::ACCOUNTS
        );
        let row = sqlx::query(&sql)
            .bind(&account.account_number)
            .bind(account.customer_id.get())
            .bind(&account.account_type)
            .bind(account.maintaining_balance_cents)
            .bind(account.monthly_fee_cents)
            .bind(now)
            .fetch_one(&self.pool)
            .await?;

        let created = account_from_row(&row)?;
        debug!(account_id = %created.id, account_number = %created.account_number, "Created account");
        Ok(created)
    }

    async fn get_account(&self, id: AccountId) -> Result<Option<Account>> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM {} WHERE id = $1", table::ACCOUNTS);
        sqlx::query(&sql)
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(account_from_row)
            .transpose()
    }

    async fn find_account_by_number(&self, account_number: &str) -> Result<Option<Account>> {
        let sql = format!(
            "SELECT {ACCOUNT_COLUMNS} FROM {} WHERE account_number = $1",
            table::ACCOUNTS
        );
        sqlx::query(&sql)
            .bind(account_number)
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(account_from_row)
            .transpose()
    }

    async fn list_accounts(&self, scope: AccountScope) -> Result<Vec<Account>> {
        let filter = match scope {
            AccountScope::All => "",
            AccountScope::Open => "WHERE status <> 'closed' AND NOT is_locked",
        };
        let sql = format!(
            "SELECT {ACCOUNT_COLUMNS} FROM {} {filter} ORDER BY id",
            table::ACCOUNTS
        );
        sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(account_from_row)
            .collect()
    }

    async fn list_transactions(
        &self,
        account_id: AccountId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Transaction>> {
        let sql = format!(
            "SELECT {TRANSACTION_COLUMNS} FROM {} WHERE account_id = $1 \
             ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3",
            table::TRANSACTIONS
        );
        sqlx::query(&sql)
            .bind(account_id.get())
            .bind(to_i64(limit))
            .bind(to_i64(offset))
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(transaction_from_row)
            .collect()
    }

    async fn list_fee_charges(&self, account_id: AccountId) -> Result<Vec<FeeCharge>> {
        let sql = format!(
            "SELECT {FEE_CHARGE_COLUMNS} FROM {} WHERE account_id = $1 \
             ORDER BY charge_date DESC, id DESC",
            table::SERVICE_FEE_CHARGES
        );
        sqlx::query(&sql)
            .bind(account_id.get())
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(fee_charge_from_row)
            .collect()
    }

    async fn get_archive(&self, account_id: AccountId) -> Result<Option<ArchivedAccount>> {
        let sql = format!(
            "SELECT {ARCHIVE_COLUMNS} FROM {} WHERE account_id = $1",
            table::ARCHIVED_ACCOUNTS
        );
        sqlx::query(&sql)
            .bind(account_id.get())
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(archive_from_row)
            .transpose()
    }
}

/// A unit of work over [`PgStore`]. Dropping it rolls the transaction back.
pub struct PgUnitOfWork {
    tx: sqlx::Transaction<'static, Postgres>,
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn lock_account(&mut self, id: AccountId) -> Result<Option<Account>> {
        let sql = format!(
            "SELECT {ACCOUNT_COLUMNS} FROM {} WHERE id = $1 FOR UPDATE",
            table::ACCOUNTS
        );
        sqlx::query(&sql)
            .bind(id.get())
            .fetch_optional(&mut *self.tx)
            .await?
            .as_ref()
            .map(account_from_row)
            .transpose()
    }

    async fn lock_account_by_number(&mut self, account_number: &str) -> Result<Option<Account>> {
        let sql = format!(
            "SELECT {ACCOUNT_COLUMNS} FROM {} WHERE account_number = $1 FOR UPDATE",
            table::ACCOUNTS
        );
        sqlx::query(&sql)
            .bind(account_number)
            .fetch_optional(&mut *self.tx)
            .await?
            .as_ref()
            .map(account_from_row)
            .transpose()
    }

    async fn type_totals(&mut self, account_id: AccountId) -> Result<Vec<TypeTotal>> {
        let sql = format!(
            "SELECT transaction_type, SUM(amount_cents)::BIGINT AS total_cents FROM {} \
             WHERE account_id = $1 GROUP BY transaction_type",
            table::TRANSACTIONS
        );
        let rows = sqlx::query(&sql)
            .bind(account_id.get())
            .fetch_all(&mut *self.tx)
            .await?;

        let mut totals = Vec::with_capacity(rows.len());
        for row in rows {
            totals.push(TypeTotal {
                transaction_type: row.try_get("transaction_type")?,
                total_cents: row.try_get("total_cents")?,
            });
        }
        Ok(totals)
    }

    async fn ledger(&mut self, account_id: AccountId) -> Result<Vec<Transaction>> {
        let sql = format!(
            "SELECT {TRANSACTION_COLUMNS} FROM {} WHERE account_id = $1 ORDER BY created_at, id",
            table::TRANSACTIONS
        );
        sqlx::query(&sql)
            .bind(account_id.get())
            .fetch_all(&mut *self.tx)
            .await?
            .iter()
            .map(transaction_from_row)
            .collect()
    }

    async fn insert_transaction(&mut self, transaction: &NewTransaction) -> Result<Transaction> {
        let sql = format!(
            "INSERT INTO {} (reference, account_id, related_account_id, transaction_type, \
             amount_cents, description, employee_id, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {TRANSACTION_COLUMNS}",
            table::TRANSACTIONS
        );
        let row = sqlx::query(&sql)
            .bind(&transaction.reference)
            .bind(transaction.account_id.get())
            .bind(transaction.related_account_id.map(AccountId::get))
            .bind(transaction.transaction_type.as_str())
            .bind(transaction.amount_cents)
            .bind(&transaction.description)
            .bind(transaction.employee_id.map(EmployeeId::get))
            .bind(transaction.created_at)
            .fetch_one(&mut *self.tx)
            .await?;
        transaction_from_row(&row)
    }

    async fn update_account(&mut self, account: &Account) -> Result<()> {
        let sql = format!(
            "UPDATE {} SET status = $2, is_locked = $3, below_maintaining_since = $4, \
             last_service_fee_date = $5, closure_warning_date = $6, closure_date = $7, \
             updated_at = $8 WHERE id = $1",
            table::ACCOUNTS
        );
        let result = sqlx::query(&sql)
            .bind(account.id.get())
            .bind(account.status.as_str())
            .bind(account.is_locked)
            .bind(account.below_maintaining_since)
            .bind(account.last_service_fee_date)
            .bind(account.closure_warning_date)
            .bind(account.closure_date)
            .bind(account.updated_at)
            .execute(&mut *self.tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                entity: "account",
                id: account.id.to_string(),
            });
        }
        Ok(())
    }

    async fn last_fee_charge_date(&mut self, account_id: AccountId) -> Result<Option<NaiveDate>> {
        let sql = format!(
            "SELECT MAX(charge_date) AS last_charge FROM {} WHERE account_id = $1",
            table::SERVICE_FEE_CHARGES
        );
        let row = sqlx::query(&sql)
            .bind(account_id.get())
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(row.try_get("last_charge")?)
    }

    async fn insert_fee_charge(&mut self, charge: &NewFeeCharge) -> Result<FeeCharge> {
        let sql = format!(
            "INSERT INTO {} (account_id, transaction_id, balance_before_cents, \
             balance_after_cents, charge_date, fee_category) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {FEE_CHARGE_COLUMNS}",
            table::SERVICE_FEE_CHARGES
        );
        let row = sqlx::query(&sql)
            .bind(charge.account_id.get())
            .bind(charge.transaction_id.get())
            .bind(charge.balance_before_cents)
            .bind(charge.balance_after_cents)
            .bind(charge.charge_date)
            .bind(charge.fee_category.as_str())
            .fetch_one(&mut *self.tx)
            .await?;
        fee_charge_from_row(&row)
    }

    async fn insert_archive(&mut self, archive: &ArchivedAccount) -> Result<()> {
        let sql = format!(
            "INSERT INTO {} ({ARCHIVE_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)",
            table::ARCHIVED_ACCOUNTS
        );
        sqlx::query(&sql)
            .bind(archive.account_id.get())
            .bind(&archive.account_number)
            .bind(archive.customer_id.get())
            .bind(&archive.account_type)
            .bind(archive.maintaining_balance_cents)
            .bind(archive.monthly_fee_cents)
            .bind(archive.status.as_str())
            .bind(archive.was_locked)
            .bind(archive.below_maintaining_since)
            .bind(archive.last_service_fee_date)
            .bind(archive.closure_warning_date)
            .bind(archive.opened_at)
            .bind(archive.final_balance_cents)
            .bind(&archive.archive_reason)
            .bind(archive.archived_at)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::all_tables;
    use ledger_core::{TransactionType, TypeCatalog};

    async fn test_store() -> Option<PgStore> {
        let url = std::env::var("DATABASE_URL").ok()?;
        let store = PgStore::connect(&url, 2, 1_000).await.ok()?;
        store.migrate().await.ok()?;
        for name in all_tables() {
            sqlx::query(&format!("TRUNCATE {name} CASCADE"))
                .execute(store.pool())
                .await
                .ok()?;
        }
        Some(store)
    }

    #[tokio::test]
    #[ignore = "requires DATABASE_URL"]
    async fn rollback_discards_ledger_rows() {
        let Some(store) = test_store().await else {
            return;
        };
        let account = store
            .create_account(
                &NewAccount {
                    account_number: "PG-1".into(),
                    customer_id: CustomerId::new(7),
                    account_type: "savings".into(),
                    maintaining_balance_cents: 10_000,
                    monthly_fee_cents: 300,
                },
                Utc::now(),
            )
            .await
            .unwrap();

        let mut uow = store.begin().await.unwrap();
        uow.lock_account(account.id).await.unwrap().unwrap();
        uow.insert_transaction(&NewTransaction {
            reference: "DEP-PG".into(),
            account_id: account.id,
            related_account_id: None,
            transaction_type: ledger_core::TransactionType::Deposit,
            amount_cents: 5_000,
            description: "pg deposit".into(),
            employee_id: None,
            created_at: Utc::now(),
        })
        .await
        .unwrap();
        assert_eq!(uow.type_totals(account.id).await.unwrap()[0].total_cents, 5_000);
        uow.rollback().await.unwrap();

        assert!(store
            .list_transactions(account.id, 10, 0)
            .await
            .unwrap()
            .is_empty());
    }

    fn posting(
        account_id: AccountId,
        transaction_type: TransactionType,
        amount_cents: i64,
    ) -> NewTransaction {
        NewTransaction {
            reference: format!("{}-PG", transaction_type.reference_prefix()),
            account_id,
            related_account_id: None,
            transaction_type,
            amount_cents,
            description: "pg race".into(),
            employee_id: None,
            created_at: Utc::now(),
        }
    }

    /// Lock, read the balance, hold the lock a moment, then withdraw
    /// everything if the balance still covers it.
    async fn withdraw_everything(store: PgStore, account_id: AccountId) -> bool {
        let mut uow = store.begin().await.unwrap();
        uow.lock_account(account_id).await.unwrap().unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        let totals = uow.type_totals(account_id).await.unwrap();
        let balance = TypeCatalog::default().balance_from_totals(
            totals
                .iter()
                .map(|t| (t.transaction_type.as_str(), t.total_cents)),
        );
        if balance < 5_000 {
            uow.rollback().await.unwrap();
            return false;
        }

        uow.insert_transaction(&posting(account_id, TransactionType::Withdrawal, 5_000))
            .await
            .unwrap();
        uow.commit().await.unwrap();
        true
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    #[ignore = "requires DATABASE_URL"]
    async fn row_lock_serializes_competing_withdrawals() {
        let Some(store) = test_store().await else {
            return;
        };
        let account = store
            .create_account(
                &NewAccount {
                    account_number: "PG-2".into(),
                    customer_id: CustomerId::new(7),
                    account_type: "savings".into(),
                    maintaining_balance_cents: 0,
                    monthly_fee_cents: 0,
                },
                Utc::now(),
            )
            .await
            .unwrap();
        let mut uow = store.begin().await.unwrap();
        uow.insert_transaction(&posting(account.id, TransactionType::Deposit, 5_000))
            .await
            .unwrap();
        uow.commit().await.unwrap();

        let (first, second) = tokio::join!(
            tokio::spawn(withdraw_everything(store.clone(), account.id)),
            tokio::spawn(withdraw_everything(store.clone(), account.id)),
        );

        assert_ne!(first.unwrap(), second.unwrap());
        let rows = store.list_transactions(account.id, 10, 0).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(TypeCatalog::default().balance_of(&rows), 0);
    }
}
