//! Date/time normalization.
//!
//! Converts heterogeneous date inputs (ISO instants, plain dates, natural
//! language phrases) into a single canonical instant representation and its
//! derived calendar-date projection. The reference timezone is UTC
//! throughout; `due_date` is always derived from `due_at` via
//! [`project_date`] so the two never drift.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};

/// Combine a calendar date and optional time into an instant.
///
/// No date yields no instant. An all-day entry (or one without a time) pins
/// the instant to midnight UTC of that date.
pub fn combine(
    date: Option<NaiveDate>,
    time: Option<NaiveTime>,
    all_day: bool,
) -> Option<DateTime<Utc>> {
    let date = date?;
    let time = if all_day { None } else { time };
    let time = time.unwrap_or_else(|| NaiveTime::from_hms_opt(0, 0, 0).unwrap_or_default());
    Some(Utc.from_utc_datetime(&date.and_time(time)))
}

/// Extract the calendar-date projection of an instant.
///
/// This is the canonical way `due_date` is derived from `due_at`; it must be
/// reapplied on every write.
pub fn project_date(instant: DateTime<Utc>) -> NaiveDate {
    instant.date_naive()
}

/// True iff the instant's time-of-day component is exactly midnight.
pub fn is_all_day(instant: DateTime<Utc>) -> bool {
    instant.time() == NaiveTime::from_hms_opt(0, 0, 0).unwrap_or_default()
}

/// Resolve a raw date string through three tiers, in priority order:
/// explicit ISO instant (has a time separator), plain `YYYY-MM-DD`, then
/// natural-language phrase. Unparseable input yields `None` — the field is
/// left unset, never defaulted to now.
pub fn resolve_date_input(raw: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if trimmed.contains('T') {
        if let Some(instant) = parse_iso_instant(trimmed) {
            return Some(instant);
        }
        // A 'T' separator that does not parse is malformed, not a phrase.
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return combine(Some(date), None, true);
    }

    let (date, time) = resolve_phrase(trimmed, now)?;
    combine(Some(date), time, false)
}

/// Parse an explicit ISO instant, with or without offset or seconds.
fn parse_iso_instant(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Some(instant.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(raw, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    None
}

/// Resolve a natural-language date phrase relative to `now`, extracting an
/// explicit clock time if one is present ("friday at 5pm").
///
/// Recognized: today/tomorrow/yesterday, weekday names (optionally prefixed
/// with "next"), and "in N days"/"in N weeks". Anything else yields `None`.
pub fn resolve_phrase(phrase: &str, now: DateTime<Utc>) -> Option<(NaiveDate, Option<NaiveTime>)> {
    let lowered = phrase.to_lowercase();
    let tokens: Vec<&str> = lowered.split_whitespace().collect();
    if tokens.is_empty() {
        return None;
    }

    let (date_tokens, time) = split_clock_time(&tokens);
    let today = now.date_naive();

    let date = match date_tokens.as_slice() {
        ["today"] => today,
        ["tomorrow"] => today + Duration::days(1),
        ["yesterday"] => today - Duration::days(1),
        [day] => today + Duration::days(days_until_weekday(today, parse_weekday_name(day)?)),
        ["next", day] => {
            today + Duration::days(days_until_weekday(today, parse_weekday_name(day)?))
        }
        ["in", count, unit] => {
            let count: i64 = count.parse().ok()?;
            match *unit {
                "day" | "days" => today + Duration::days(count),
                "week" | "weeks" => today + Duration::weeks(count),
                _ => return None,
            }
        }
        _ => return None,
    };

    Some((date, time))
}

/// Strip an "at HH[:MM][am|pm]" suffix from the token list, returning the
/// remaining date tokens and the parsed time.
fn split_clock_time<'a>(tokens: &[&'a str]) -> (Vec<&'a str>, Option<NaiveTime>) {
    if let Some(position) = tokens.iter().position(|token| *token == "at") {
        if let Some(time) = tokens.get(position + 1).and_then(|token| parse_clock_token(token)) {
            let mut rest = tokens[..position].to_vec();
            rest.extend_from_slice(&tokens[position + 2..]);
            return (rest, Some(time));
        }
    }
    (tokens.to_vec(), None)
}

/// Parse a clock token: "17:30", "5pm", "5:30pm", "9".
fn parse_clock_token(token: &str) -> Option<NaiveTime> {
    let (digits, meridiem) = if let Some(stripped) = token.strip_suffix("am") {
        (stripped, Some(false))
    } else if let Some(stripped) = token.strip_suffix("pm") {
        (stripped, Some(true))
    } else {
        (token, None)
    };

    let (hour, minute) = match digits.split_once(':') {
        Some((hour, minute)) => (hour.parse::<u32>().ok()?, minute.parse::<u32>().ok()?),
        None => (digits.parse::<u32>().ok()?, 0),
    };

    let hour = match meridiem {
        Some(true) if hour < 12 => hour + 12,
        Some(false) if hour == 12 => 0,
        _ => hour,
    };

    NaiveTime::from_hms_opt(hour, minute, 0)
}

/// Days until the next `target` weekday, strictly in the future (7 when
/// today already is that weekday).
pub fn days_until_weekday(today: NaiveDate, target: Weekday) -> i64 {
    let delta = (i64::from(target.num_days_from_monday())
        - i64::from(today.weekday().num_days_from_monday()))
    .rem_euclid(7);
    if delta == 0 {
        7
    } else {
        delta
    }
}

fn parse_weekday_name(name: &str) -> Option<Weekday> {
    match name {
        "monday" | "mon" => Some(Weekday::Mon),
        "tuesday" | "tue" => Some(Weekday::Tue),
        "wednesday" | "wed" => Some(Weekday::Wed),
        "thursday" | "thu" => Some(Weekday::Thu),
        "friday" | "fri" => Some(Weekday::Fri),
        "saturday" | "sat" => Some(Weekday::Sat),
        "sunday" | "sun" => Some(Weekday::Sun),
        _ => None,
    }
}
