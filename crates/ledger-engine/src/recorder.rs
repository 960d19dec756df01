//! Transaction recorder.
//!
//! The only code path that appends ledger rows. The caller must already hold
//! the account's row lock through the unit of work it passes in.

use chrono::{DateTime, Utc};
use tracing::debug;

use ledger_core::{
    ensure_positive, generate_reference, Account, AccountId, Actor, NewTransaction, Result,
    Transaction, TransactionType, TypeCatalog,
};
use ledger_store::UnitOfWork;

/// One ledger row to append.
#[derive(Debug, Clone)]
pub struct Posting<'a> {
    /// Locked account receiving the row.
    pub account: &'a Account,
    /// Catalog type.
    pub transaction_type: TransactionType,
    /// Unsigned amount in cents.
    pub amount_cents: i64,
    /// Free text shown in statements.
    pub description: String,
    /// Counterparty account, for transfers.
    pub related_account_id: Option<AccountId>,
    /// Shared reference; generated when `None`.
    pub reference: Option<String>,
}

impl<'a> Posting<'a> {
    /// A posting with no counterparty and a generated reference.
    #[must_use]
    pub fn new(
        account: &'a Account,
        transaction_type: TransactionType,
        amount_cents: i64,
        description: impl Into<String>,
    ) -> Self {
        Self {
            account,
            transaction_type,
            amount_cents,
            description: description.into(),
            related_account_id: None,
            reference: None,
        }
    }

    /// Link the row to a counterparty account.
    #[must_use]
    pub fn related_to(mut self, account_id: AccountId) -> Self {
        self.related_account_id = Some(account_id);
        self
    }

    /// Reuse an existing reference.
    #[must_use]
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }
}

/// Appends rows after checking them against the catalog.
#[derive(Debug, Clone, Copy)]
pub struct TransactionRecorder<'a> {
    catalog: &'a TypeCatalog,
}

impl<'a> TransactionRecorder<'a> {
    /// A recorder over `catalog`.
    #[must_use]
    pub const fn new(catalog: &'a TypeCatalog) -> Self {
        Self { catalog }
    }

    /// Append `posting` on behalf of `actor`.
    ///
    /// # Errors
    ///
    /// - `LedgerError::InvalidAmount` for a non-positive amount
    /// - `LedgerError::Configuration` if the type is missing from the catalog
    /// - `LedgerError::AccountLocked` / `AccountClosed` for frozen accounts
    pub async fn record(
        &self,
        uow: &mut dyn UnitOfWork,
        posting: Posting<'_>,
        actor: Actor,
        now: DateTime<Utc>,
    ) -> Result<Transaction> {
        ensure_positive(posting.amount_cents)?;
        self.catalog.require(posting.transaction_type)?;
        // Frozen accounts take no postings of either sign.
        posting.account.ensure_credit_allowed()?;

        let reference = posting.reference.unwrap_or_else(|| {
            generate_reference(posting.transaction_type, now.date_naive(), posting.account.id)
        });

        let row = uow
            .insert_transaction(&NewTransaction {
                reference,
                account_id: posting.account.id,
                related_account_id: posting.related_account_id,
                transaction_type: posting.transaction_type,
                amount_cents: posting.amount_cents,
                description: posting.description,
                employee_id: actor.employee_id(),
                created_at: now,
            })
            .await?;

        debug!(
            account_id = %row.account_id,
            transaction_id = %row.id,
            reference = %row.reference,
            transaction_type = %row.transaction_type,
            amount_cents = row.amount_cents,
            actor = %actor,
            "Recorded transaction"
        );
        Ok(row)
    }
}
