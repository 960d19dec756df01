//! Teller operations: withdrawals and deposits.

use serde::Serialize;
use tracing::info;

use ledger_core::{
    add_cents, ensure_positive, AccountStatus, Actor, LedgerError, Result, Transaction,
    TransactionType, Transition, Trigger,
};
use ledger_store::UnitOfWork;

use crate::balance::current_balance;
use crate::recorder::Posting;
use crate::warnings::{maintaining_warnings, Warning};
use crate::{finish, not_found, Engine};

/// Result of a teller operation.
#[derive(Debug, Clone, Serialize)]
pub struct Receipt {
    /// The ledger row written.
    pub transaction: Transaction,
    /// Balance after the operation, in cents.
    pub balance_cents: i64,
    /// Status after lifecycle re-evaluation.
    pub status: AccountStatus,
    /// Lifecycle transition the operation caused.
    pub transition: Transition,
    /// Maintaining-balance warnings.
    pub warnings: Vec<Warning>,
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Withdraw,
    Deposit,
}

impl Engine {
    /// Withdraw cash from an account.
    ///
    /// # Errors
    ///
    /// - `LedgerError::InvalidAmount` for a non-positive or oversized amount
    /// - `LedgerError::AccountNotFound` for an unknown account number
    /// - `LedgerError::AccountLocked` / `AccountClosed` / `AccountFlagged`
    /// - `LedgerError::InsufficientFunds` if the balance is below the amount
    ///
    /// Nothing is written on error.
    pub async fn withdraw(
        &self,
        account_number: &str,
        amount_cents: i64,
        actor: Actor,
    ) -> Result<Receipt> {
        self.teller(Direction::Withdraw, account_number, amount_cents, actor)
            .await
    }

    /// Deposit cash into an account.
    ///
    /// Flagged accounts accept deposits so they can recover.
    ///
    /// # Errors
    ///
    /// - `LedgerError::InvalidAmount` for a non-positive or oversized amount,
    ///   or one that would overflow the balance
    /// - `LedgerError::AccountNotFound` for an unknown account number
    /// - `LedgerError::AccountLocked` / `AccountClosed`
    pub async fn deposit(
        &self,
        account_number: &str,
        amount_cents: i64,
        actor: Actor,
    ) -> Result<Receipt> {
        self.teller(Direction::Deposit, account_number, amount_cents, actor)
            .await
    }

    async fn teller(
        &self,
        direction: Direction,
        account_number: &str,
        amount_cents: i64,
        actor: Actor,
    ) -> Result<Receipt> {
        ensure_positive(amount_cents)?;

        let mut uow = self.store.begin().await?;
        let result = self
            .teller_in(uow.as_mut(), direction, account_number, amount_cents, actor)
            .await;
        let receipt = finish(uow, result).await?;

        info!(
            account_number,
            ?direction,
            amount_cents,
            balance_cents = receipt.balance_cents,
            actor = %actor,
            "Teller operation completed"
        );
        Ok(receipt)
    }

    async fn teller_in(
        &self,
        uow: &mut dyn UnitOfWork,
        direction: Direction,
        account_number: &str,
        amount_cents: i64,
        actor: Actor,
    ) -> Result<Receipt> {
        let now = self.now();
        let mut account = uow
            .lock_account_by_number(account_number)
            .await?
            .ok_or_else(|| not_found(account_number))?;

        let balance = current_balance(uow, &self.policy.catalog, account.id).await?;

        let transaction_type = match direction {
            Direction::Withdraw => {
                account.ensure_debit_allowed()?;
                if balance < amount_cents {
                    return Err(LedgerError::InsufficientFunds {
                        balance,
                        required: amount_cents,
                    });
                }
                TransactionType::Withdrawal
            }
            Direction::Deposit => {
                account.ensure_credit_allowed()?;
                add_cents(balance, amount_cents)?;
                TransactionType::Deposit
            }
        };

        let description = match direction {
            Direction::Withdraw => "Teller withdrawal",
            Direction::Deposit => "Teller deposit",
        };
        let transaction = self
            .recorder()
            .record(
                uow,
                Posting::new(&account, transaction_type, amount_cents, description),
                actor,
                now,
            )
            .await?;
        let new_balance = current_balance(uow, &self.policy.catalog, account.id).await?;

        let transition = self
            .settle(uow, &mut account, new_balance, Trigger::Mutation, now)
            .await?;

        Ok(Receipt {
            transaction,
            balance_cents: new_balance,
            status: account.status,
            transition,
            warnings: maintaining_warnings(&account, new_balance),
        })
    }
}
