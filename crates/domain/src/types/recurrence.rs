//! Recurrence rule grammar.
//!
//! Rules are stored as compact strings of the form `FREQ[:PARAM[:HH:MM]]`:
//! `DAILY`, `DAILY:09:00`, `WEEKLY:MO`, `WEEKLY:MO:09:00`, `MONTHLY:15`,
//! `MONTHLY:15:08:30`. Parsing is pure and total — malformed input yields
//! `None`, never a best-effort guess.

use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

/// How often a task repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
}

/// A structured description of a repeating schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecurrencePattern {
    pub freq: Frequency,
    /// Weekday constraint; required for weekly patterns.
    pub byday: Option<Weekday>,
    /// Day-of-month constraint (1-31); required for monthly patterns.
    pub bymonthday: Option<u32>,
    /// Explicit time-of-day. When absent, occurrences keep the time of the
    /// reference instant they are computed from.
    pub time: Option<NaiveTime>,
}

impl RecurrencePattern {
    /// Parse a rule string. Returns `None` for anything malformed.
    pub fn parse(rule: &str) -> Option<Self> {
        let segments: Vec<&str> = rule.trim().split(':').collect();
        let (freq_text, rest) = segments.split_first()?;

        let freq = match freq_text.to_ascii_uppercase().as_str() {
            "DAILY" => Frequency::Daily,
            "WEEKLY" => Frequency::Weekly,
            "MONTHLY" => Frequency::Monthly,
            _ => return None,
        };

        let (byday, bymonthday, time_segments) = match freq {
            Frequency::Daily => (None, None, rest),
            Frequency::Weekly => {
                let (code, time_rest) = rest.split_first()?;
                (Some(parse_weekday(code)?), None, time_rest)
            }
            Frequency::Monthly => {
                let (day, time_rest) = rest.split_first()?;
                let day: u32 = day.parse().ok()?;
                if !(1..=31).contains(&day) {
                    return None;
                }
                (None, Some(day), time_rest)
            }
        };

        let time = match time_segments {
            [] => None,
            [hour, minute] => {
                let hour: u32 = hour.parse().ok()?;
                let minute: u32 = minute.parse().ok()?;
                Some(NaiveTime::from_hms_opt(hour, minute, 0)?)
            }
            _ => return None,
        };

        Some(Self { freq, byday, bymonthday, time })
    }
}

/// Two-letter weekday codes as used in the rule grammar.
fn parse_weekday(code: &str) -> Option<Weekday> {
    match code.to_ascii_uppercase().as_str() {
        "MO" => Some(Weekday::Mon),
        "TU" => Some(Weekday::Tue),
        "WE" => Some(Weekday::Wed),
        "TH" => Some(Weekday::Thu),
        "FR" => Some(Weekday::Fri),
        "SA" => Some(Weekday::Sat),
        "SU" => Some(Weekday::Sun),
        _ => None,
    }
}
