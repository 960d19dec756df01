//! Common test utilities for ledger engine integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::Arc;

use chrono::{NaiveDate, Utc};

use ledger_core::{
    Account, Actor, CustomerId, EmployeeId, FixedClock, LedgerPolicy, NewAccount, NewTransaction,
    TransactionType,
};
use ledger_engine::Engine;
use ledger_store::{MemoryStore, Store};

/// Maintaining balance used by most tests: 100.00.
pub const MAINTAINING: i64 = 10_000;

/// Monthly fee used by most tests: 3.00.
pub const FEE: i64 = 300;

/// Engine over a fresh in-memory store and a settable clock.
pub struct EngineHarness {
    /// The engine under test.
    pub engine: Engine,
    /// Direct handle on the store for assertions.
    pub store: MemoryStore,
    /// The clock the engine reads.
    pub clock: Arc<FixedClock>,
}

impl EngineHarness {
    /// Harness with the default policy, starting on 2026-01-05.
    pub fn new() -> Self {
        Self::with_policy(LedgerPolicy::default())
    }

    /// Harness with a custom policy.
    pub fn with_policy(policy: LedgerPolicy) -> Self {
        let store = MemoryStore::new();
        let clock = Arc::new(FixedClock::on(date(2026, 1, 5)));
        let engine = Engine::new(Arc::new(store.clone()), clock.clone(), policy);
        Self {
            engine,
            store,
            clock,
        }
    }

    /// Open an account with the standard maintaining balance and fee.
    pub async fn open(&self, number: &str, customer: i64) -> Account {
        self.open_with(number, customer, MAINTAINING, FEE).await
    }

    /// Open an account with explicit terms.
    pub async fn open_with(
        &self,
        number: &str,
        customer: i64,
        maintaining_balance_cents: i64,
        monthly_fee_cents: i64,
    ) -> Account {
        self.store
            .create_account(
                &NewAccount {
                    account_number: number.into(),
                    customer_id: CustomerId::new(customer),
                    account_type: "savings".into(),
                    maintaining_balance_cents,
                    monthly_fee_cents,
                },
                Utc::now(),
            )
            .await
            .expect("create account")
    }

    /// Deposit through the teller path.
    pub async fn deposit(&self, number: &str, amount_cents: i64) {
        self.engine
            .deposit(number, amount_cents, teller())
            .await
            .expect("deposit");
    }

    /// Write a ledger row straight to the store, bypassing every engine check.
    pub async fn post_directly(
        &self,
        number: &str,
        transaction_type: TransactionType,
        amount_cents: i64,
    ) {
        let account = self.account(number).await;
        let mut uow = self.store.begin().await.expect("begin");
        uow.insert_transaction(&NewTransaction {
            reference: format!("SEED-{number}"),
            account_id: account.id,
            related_account_id: None,
            transaction_type,
            amount_cents,
            description: "Seeded posting".into(),
            employee_id: None,
            created_at: Utc::now(),
        })
        .await
        .expect("insert posting");
        uow.commit().await.expect("commit");
    }

    /// Reload an account.
    pub async fn account(&self, number: &str) -> Account {
        self.store
            .find_account_by_number(number)
            .await
            .expect("load account")
            .expect("account exists")
    }

    /// Current computed balance.
    pub async fn balance(&self, number: &str) -> i64 {
        self.engine
            .account_overview(number)
            .await
            .expect("overview")
            .balance_cents
    }

    /// Set the clock.
    pub fn set_date(&self, y: i32, m: u32, d: u32) {
        self.clock.set_date(date(y, m, d));
    }

    /// Today according to the engine.
    pub fn today(&self) -> NaiveDate {
        self.engine.today()
    }
}

/// Shorthand for a calendar date.
pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

/// A teller actor.
pub fn teller() -> Actor {
    Actor::Employee(EmployeeId::new(77))
}

/// A customer actor.
pub fn customer(id: i64) -> Actor {
    Actor::Customer(CustomerId::new(id))
}
