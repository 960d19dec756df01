//! Whole-day and whole-month date arithmetic used by fee and lifecycle rules.

use chrono::{Datelike, NaiveDate};

/// Whole days from `from` to `to` (negative when `to` is earlier).
#[must_use]
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

/// Whole calendar months from `from` to `to`.
///
/// A month only counts once the day-of-month has been reached again, so
/// 2026-01-31 → 2026-02-28 is 0 months and 2026-01-15 → 2026-02-15 is 1.
#[must_use]
pub fn months_between(from: NaiveDate, to: NaiveDate) -> i32 {
    if to < from {
        return -months_between(to, from);
    }
    let mut months = i64::from(to.year() - from.year()) * 12
        + i64::from(to.month())
        - i64::from(from.month());
    if to.day() < from.day() {
        months -= 1;
    }
    i32::try_from(months).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn days() {
        assert_eq!(days_between(d(2026, 1, 1), d(2026, 1, 31)), 30);
        assert_eq!(days_between(d(2026, 1, 31), d(2026, 1, 1)), -30);
    }

    #[test]
    fn months_require_day_of_month_reached() {
        assert_eq!(months_between(d(2026, 1, 15), d(2026, 2, 14)), 0);
        assert_eq!(months_between(d(2026, 1, 15), d(2026, 2, 15)), 1);
        assert_eq!(months_between(d(2026, 1, 31), d(2026, 2, 28)), 0);
        assert_eq!(months_between(d(2025, 11, 10), d(2026, 5, 10)), 6);
        assert_eq!(months_between(d(2026, 5, 10), d(2025, 11, 10)), -6);
    }
}
