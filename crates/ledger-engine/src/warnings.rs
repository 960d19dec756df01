//! Maintaining-balance warnings returned alongside successful mutations.

use serde::Serialize;

use ledger_core::{format_cents, Account};

/// Warning kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningCode {
    /// Balance is under the account's configured maintaining balance.
    BelowMaintaining,
    /// Balance is zero.
    ZeroBalance,
}

/// A non-fatal notice about the account after an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    /// Machine-readable kind.
    pub code: WarningCode,
    /// Human-readable text.
    pub message: String,
}

/// Warnings for `account` at `balance_cents`.
#[must_use]
pub fn maintaining_warnings(account: &Account, balance_cents: i64) -> Vec<Warning> {
    let mut warnings = Vec::new();

    if account.maintaining_balance_cents > 0 && balance_cents < account.maintaining_balance_cents {
        warnings.push(Warning {
            code: WarningCode::BelowMaintaining,
            message: format!(
                "Balance {} is below the maintaining balance of {}; monthly fees will apply",
                format_cents(balance_cents),
                format_cents(account.maintaining_balance_cents)
            ),
        });
    }
    if balance_cents <= 0 {
        warnings.push(Warning {
            code: WarningCode::ZeroBalance,
            message: "Account balance is 0.00".to_string(),
        });
    }

    warnings
}
