//! Recurrence engine.
//!
//! Computes the next occurrence of a recurrence pattern strictly after a
//! reference instant. Invalid or malformed patterns yield `None` — the
//! engine never fails into the caller's control flow.

use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use tasklane_domain::{Frequency, RecurrencePattern};

/// Upper bound on the day-by-day scan. Every valid pattern produces an
/// occurrence well within this window (a day-of-month exists at least once
/// every 62 days).
const MAX_SCAN_DAYS: i64 = 366;

/// Compute the first occurrence of `pattern` strictly after `from`.
///
/// Weekly patterns are constrained to their single weekday; monthly patterns
/// to their single day-of-month, skipping months where that day does not
/// exist (no clamping). An explicit pattern `time` overrides the
/// time-of-day; otherwise the occurrence keeps `from`'s time-of-day.
pub fn next_occurrence(pattern: &RecurrencePattern, from: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let byday = pattern.byday;
    let bymonthday = pattern.bymonthday;
    match pattern.freq {
        Frequency::Weekly if byday.is_none() => return None,
        Frequency::Monthly if bymonthday.is_none() => return None,
        _ => {}
    }

    let time_of_day = pattern.time.unwrap_or_else(|| from.time());
    let start = from.date_naive();

    for offset in 0..=MAX_SCAN_DAYS {
        let date = start + Duration::days(offset);
        let matches = match pattern.freq {
            Frequency::Daily => true,
            Frequency::Weekly => byday == Some(date.weekday()),
            Frequency::Monthly => bymonthday == Some(date.day()),
        };
        if !matches {
            continue;
        }
        let candidate = Utc.from_utc_datetime(&date.and_time(time_of_day));
        if candidate > from {
            return Some(candidate);
        }
    }

    None
}

/// Parse `rule` and advance from `from`; `None` when the rule is malformed.
pub fn next_occurrence_for_rule(rule: &str, from: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let pattern = RecurrencePattern::parse(rule)?;
    next_occurrence(&pattern, from)
}
