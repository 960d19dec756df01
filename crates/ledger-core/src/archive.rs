//! Archived account snapshots.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{Account, AccountId, AccountStatus, CustomerId};

/// Point-in-time copy of an account taken just before it is closed.
///
/// Written once. The live account row is kept (closed and locked), never
/// deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchivedAccount {
    /// Archived account.
    pub account_id: AccountId,
    /// Account number at archive time.
    pub account_number: String,
    /// Owner.
    pub customer_id: CustomerId,
    /// Product name.
    pub account_type: String,
    /// Maintaining requirement, in cents.
    pub maintaining_balance_cents: i64,
    /// Fee per interval, in cents.
    pub monthly_fee_cents: i64,
    /// Status before archiving.
    pub status: AccountStatus,
    /// Lock flag before archiving.
    pub was_locked: bool,
    /// Lifecycle dates before archiving.
    pub below_maintaining_since: Option<NaiveDate>,
    /// Last fee date before archiving.
    pub last_service_fee_date: Option<NaiveDate>,
    /// Warning date before archiving.
    pub closure_warning_date: Option<NaiveDate>,
    /// When the account was opened.
    pub opened_at: DateTime<Utc>,
    /// Ledger balance at archive time, in cents.
    pub final_balance_cents: i64,
    /// Why it was archived.
    pub archive_reason: String,
    /// When it was archived.
    pub archived_at: DateTime<Utc>,
}

impl ArchivedAccount {
    /// Snapshot `account` as it is right now.
    #[must_use]
    pub fn snapshot(
        account: &Account,
        final_balance_cents: i64,
        archive_reason: impl Into<String>,
        archived_at: DateTime<Utc>,
    ) -> Self {
        Self {
            account_id: account.id,
            account_number: account.account_number.clone(),
            customer_id: account.customer_id,
            account_type: account.account_type.clone(),
            maintaining_balance_cents: account.maintaining_balance_cents,
            monthly_fee_cents: account.monthly_fee_cents,
            status: account.status,
            was_locked: account.is_locked,
            below_maintaining_since: account.below_maintaining_since,
            last_service_fee_date: account.last_service_fee_date,
            closure_warning_date: account.closure_warning_date,
            opened_at: account.created_at,
            final_balance_cents,
            archive_reason: archive_reason.into(),
            archived_at,
        }
    }
}
