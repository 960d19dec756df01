//! Database schema definitions.
//!
//! Table names and the column lists selected by the PostgreSQL backend. The
//! DDL itself lives in `migrations/`.

/// Table names.
pub mod table {
    /// Account rows, keyed by `id`, unique on `account_number`.
    pub const ACCOUNTS: &str = "accounts";

    /// Append-only ledger rows.
    pub const TRANSACTIONS: &str = "transactions";

    /// Fee-charge audit rows, one per fee event.
    pub const SERVICE_FEE_CHARGES: &str = "service_fee_charges";

    /// Archive snapshots, at most one per account.
    pub const ARCHIVED_ACCOUNTS: &str = "archived_accounts";
}

/// Columns selected for an [`ledger_core::Account`].
pub const ACCOUNT_COLUMNS: &str = "id, account_number, customer_id, account_type, \
     maintaining_balance_cents, monthly_fee_cents, is_locked, status, \
     below_maintaining_since, last_service_fee_date, closure_warning_date, closure_date, \
     created_at, updated_at";

/// Columns selected for a [`ledger_core::Transaction`].
pub const TRANSACTION_COLUMNS: &str = "id, reference, account_id, related_account_id, \
     transaction_type, amount_cents, description, employee_id, created_at";

/// Columns selected for a [`ledger_core::FeeCharge`].
pub const FEE_CHARGE_COLUMNS: &str = "id, account_id, transaction_id, balance_before_cents, \
     balance_after_cents, charge_date, fee_category";

/// Columns selected for a [`ledger_core::ArchivedAccount`].
pub const ARCHIVE_COLUMNS: &str = "account_id, account_number, customer_id, account_type, \
     maintaining_balance_cents, monthly_fee_cents, status, was_locked, \
     below_maintaining_since, last_service_fee_date, closure_warning_date, opened_at, \
     final_balance_cents, archive_reason, archived_at";

/// Returns all table names, children first (safe order for truncation).
#[must_use]
pub fn all_tables() -> Vec<&'static str> {
    vec![
        table::ARCHIVED_ACCOUNTS,
        table::SERVICE_FEE_CHARGES,
        table::TRANSACTIONS,
        table::ACCOUNTS,
    ]
}
