//! Calendar-day arithmetic.
//!
//! Every comparison in the decision core operates on whole calendar days in
//! the system's reference timezone (UTC), never on raw instants. The single
//! exception is the rehabilitation day-rollover rule, which deliberately
//! compares a wall-clock instant against [`rollover_instant`].

use crate::{Error, Result};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};

/// Truncate an instant to its calendar day in the reference timezone
pub fn normalize_to_day(instant: DateTime<Utc>) -> NaiveDate {
    instant.date_naive()
}

/// Parse a strict zero-padded `YYYY-MM-DD` string
///
/// Impossible dates (`2024-02-30`) and non-canonical forms (`2024-1-5`) are
/// rejected with [`Error::InvalidDate`].
pub fn parse_day(s: &str) -> Result<NaiveDate> {
    let trimmed = s.trim();
    let day = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .map_err(|_| Error::InvalidDate(s.to_string()))?;
    // chrono accepts unpadded components; require the canonical form
    if format_day(day) != trimmed {
        return Err(Error::InvalidDate(s.to_string()));
    }
    Ok(day)
}

/// Format a day as zero-padded `YYYY-MM-DD` (inverse of [`parse_day`])
pub fn format_day(day: NaiveDate) -> String {
    day.format("%Y-%m-%d").to_string()
}

/// Whole days from `a` to `b` (`b - a`), negative when `b` precedes `a`
pub fn days_between(a: NaiveDate, b: NaiveDate) -> i64 {
    (b - a).num_days()
}

/// Shift a day by `n` whole days (negative shifts backwards)
pub fn add_days(day: NaiveDate, n: i64) -> NaiveDate {
    day + Duration::days(n)
}

/// The instant at which a completed plan day rolls over to the next one
///
/// Start of the calendar day after `day`, plus `rollover_hour` whole hours.
/// An out-of-range hour falls back to midnight; config validation keeps the
/// hour below 24 before it reaches here.
pub fn rollover_instant(day: NaiveDate, rollover_hour: u32) -> DateTime<Utc> {
    let next = day.succ_opt().unwrap_or(NaiveDate::MAX);
    next.and_hms_opt(rollover_hour, 0, 0)
        .unwrap_or_else(|| next.and_time(NaiveTime::MIN))
        .and_utc()
}
