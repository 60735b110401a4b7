//! Exception activity and conflict detection.
//!
//! Decides whether a worker exception is in force on a given calendar day and
//! whether a proposed date range collides with an existing exception. Schedule
//! creation and rehabilitation gating both sit on top of these checks.

use crate::calendar;
use crate::types::Exception;
use chrono::NaiveDate;

/// Is the exception in force on the given calendar day?
///
/// Check order matters: the explicit `is_active` override short-circuits,
/// then the deactivation day (an exception deactivated at instant `t` is
/// inactive from `t`'s calendar day onward), then the start/end bounds.
/// A missing `end_date` means open-ended.
pub fn is_active_on(exception: &Exception, day: NaiveDate) -> bool {
    if !exception.is_active {
        return false;
    }
    if let Some(deactivated_at) = exception.deactivated_at {
        if calendar::normalize_to_day(deactivated_at) <= day {
            return false;
        }
    }
    if day < exception.start_date {
        return false;
    }
    if let Some(end_date) = exception.end_date {
        if day > end_date {
            return false;
        }
    }
    true
}

/// All exceptions in force on the given day
pub fn active_exceptions_on<'a>(
    exceptions: &'a [Exception],
    day: NaiveDate,
) -> Vec<&'a Exception> {
    exceptions
        .iter()
        .filter(|e| is_active_on(e, day))
        .collect()
}

/// Find the first exception conflicting with a proposed date range
///
/// An exception is a candidate when its range overlaps the proposed one
/// (`start <= range_end` and `end`, if set, `>= range_start`). Candidates are
/// confirmed by sampling activity at the range start, range end, and midpoint
/// day; activity is monotonic within a contiguous interval once deactivation
/// is accounted for, so the three samples suffice for range-vs-range overlap.
///
/// This is a documented approximation, not an exhaustive day-by-day scan: a
/// non-conflict result does not guarantee the absence of a conflict on every
/// individual day, and an exception type with internal gaps would break the
/// sampling assumption.
pub fn find_conflict<'a>(
    exceptions: &'a [Exception],
    range_start: NaiveDate,
    range_end: NaiveDate,
) -> Option<&'a Exception> {
    let midpoint = calendar::add_days(
        range_start,
        calendar::days_between(range_start, range_end) / 2,
    );

    for exception in exceptions {
        let overlaps = exception.start_date <= range_end
            && exception.end_date.map_or(true, |end| end >= range_start);
        if !overlaps {
            continue;
        }
        if [range_start, range_end, midpoint]
            .into_iter()
            .any(|day| is_active_on(exception, day))
        {
            tracing::debug!(
                "Range {}..{} conflicts with exception {}",
                range_start,
                range_end,
                exception.id
            );
            return Some(exception);
        }
    }
    None
}
