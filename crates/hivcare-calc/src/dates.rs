//! Calendar arithmetic used by the rule library
//!
//! Day counts are whole days truncated toward zero. Month arithmetic is
//! calendar based: adding a month to January 31 lands on the last day of
//! February, and a month has elapsed only once the same day-of-month (or
//! the clamped month end) has been reached.

use crate::context::CalculationContext;
use chrono::{Datelike, Months, NaiveDateTime};

/// Whole days from `from` to `to`, negative when `to` is earlier
pub fn days_between(from: NaiveDateTime, to: NaiveDateTime) -> i64 {
    to.signed_duration_since(from).num_days()
}

/// Whole days from `t` to the context's reference time
pub fn days_since(t: NaiveDateTime, ctx: &CalculationContext<'_>) -> i64 {
    days_between(t, ctx.now)
}

/// Add calendar months, clamping to the end of the target month
///
/// Saturates at the largest representable datetime.
pub fn add_months(t: NaiveDateTime, months: u32) -> NaiveDateTime {
    t.checked_add_months(Months::new(months)).unwrap_or(NaiveDateTime::MAX)
}

/// Whole calendar months between two instants, regardless of order
///
/// The result is the largest `n` such that `add_months(earlier, n) <= later`.
pub fn months_between(a: NaiveDateTime, b: NaiveDateTime) -> u32 {
    let (earlier, later) = if a <= b { (a, b) } else { (b, a) };

    let years = (later.year() - earlier.year()) as i64;
    let months = later.month() as i64 - earlier.month() as i64;
    let mut n = (years * 12 + months).max(0) as u32;

    // the candidate can overshoot by one when the day or time hasn't come round yet
    while n > 0 && add_months(earlier, n) > later {
        n -= 1;
    }
    n
}
