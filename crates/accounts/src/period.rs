use chrono::{DateTime, Months, Utc};

/// Advance by one calendar month. The day is clamped to the end of a
/// shorter month, so Jan 31 becomes Feb 29 in a leap year and Feb 28
/// otherwise. `None` only past the representable range.
pub fn add_one_month(at: DateTime<Utc>) -> Option<DateTime<Utc>> {
    at.checked_add_months(Months::new(1))
}
