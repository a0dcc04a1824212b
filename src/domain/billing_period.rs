use chrono::{DateTime, Months, Utc};

/// Same instant one calendar month later.
///
/// The day of month is clamped to the last valid day of the target month, so
/// Jan 31 maps to Feb 28 (or 29) and Mar 31 to Apr 30.
pub fn add_one_month(from: DateTime<Utc>) -> DateTime<Utc> {
    add_months(from, 1)
}

pub fn add_months(from: DateTime<Utc>, months: u32) -> DateTime<Utc> {
    // Months arithmetic clamps to the end of the month; it only fails past chrono's max date.
    from.checked_add_months(Months::new(months))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
