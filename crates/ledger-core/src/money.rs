//! Currency amount helpers.
//!
//! Amounts are stored as `i64` integer cents to avoid floating point
//! precision issues. `150075` is `1500.75`.

use crate::{LedgerError, Result};

/// Largest amount a single operation may move, in cents (100 billion).
pub const MAX_AMOUNT_CENTS: i64 = 10_000_000_000_000;

/// Add two cent amounts, rejecting overflow.
///
/// # Errors
///
/// Returns `LedgerError::InvalidAmount` if the sum does not fit in an `i64`.
pub fn add_cents(a: i64, b: i64) -> Result<i64> {
    a.checked_add(b).ok_or_else(|| {
        LedgerError::InvalidAmount(format!("{a} + {b} overflows the amount range"))
    })
}

/// Format integer cents as a two-decimal string (`-12.05`, `0.00`).
#[must_use]
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_whole_and_fractional_amounts() {
        assert_eq!(format_cents(0), "0.00");
        assert_eq!(format_cents(5), "0.05");
        assert_eq!(format_cents(150_075), "1500.75");
        assert_eq!(format_cents(-1205), "-12.05");
    }

    #[test]
    fn add_cents_rejects_overflow() {
        assert_eq!(add_cents(100, 250).unwrap(), 350);
        assert!(matches!(
            add_cents(i64::MAX, 1),
            Err(LedgerError::InvalidAmount(_))
        ));
    }
}
