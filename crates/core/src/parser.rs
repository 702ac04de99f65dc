//! Rule-based command parser.
//!
//! A deterministic grammar over a small verb set. Dispatch is by the first
//! whitespace-delimited token, case-insensitive. The parser always returns
//! exactly one action — a command it cannot understand becomes a `Noop`
//! carrying a human-readable reason the caller can surface directly, never
//! an error.

use chrono::{DateTime, Duration, Utc, Weekday};
use tasklane_domain::constants::MIN_UNAMBIGUOUS_TITLE_LENGTH;
use tasklane_domain::{Action, CommandResponse, TaskMatch, TaskPatch, TaskStatus};
use tracing::debug;

use crate::datetime::days_until_weekday;

const USAGE_HINT: &str = "I did not understand that command. Try: 'add buy milk tomorrow', \
     'mark buy milk as done', 'rename buy milk to buy oat milk', \
     'set due date for buy milk to friday', or 'delete buy milk'.";

/// The deterministic fallback parser. Stateless; safe to share.
#[derive(Debug, Default, Clone, Copy)]
pub struct RuleBasedParser;

impl RuleBasedParser {
    /// Parse `input` relative to the current time.
    pub fn parse(&self, input: &str) -> CommandResponse {
        self.parse_at(input, Utc::now())
    }

    /// Parse `input` with an explicit reference time. Date words like
    /// "tomorrow" resolve against `now`, which keeps parsing deterministic
    /// under test.
    pub fn parse_at(&self, input: &str, now: DateTime<Utc>) -> CommandResponse {
        let mut tokens = input.split_whitespace();
        let verb = tokens.next().unwrap_or_default().to_lowercase();
        let rest: Vec<&str> = tokens.collect();

        debug!(verb = %verb, "rule parser dispatch");

        match verb.as_str() {
            "add" | "create" | "new" => parse_create(&rest, now),
            "delete" | "remove" | "rm" => parse_delete(&rest),
            "mark" | "complete" | "finish" | "done" => parse_mark(&verb, &rest),
            "rename" | "change" => parse_rename(&rest),
            "set" if mentions_due_date(&rest) => parse_set_due(&rest, now),
            _ => noop(USAGE_HINT),
        }
    }
}

fn noop(reason: &str) -> CommandResponse {
    CommandResponse::single(Action::Noop { reason: reason.to_string() }, "No changes")
}

/// `add|create|new <title> [today|tomorrow]` — bare date words are stripped
/// from the title and become the due date (date only, no time).
fn parse_create(rest: &[&str], now: DateTime<Utc>) -> CommandResponse {
    let mut title_tokens: Vec<&str> = Vec::with_capacity(rest.len());
    let mut due: Option<chrono::NaiveDate> = None;

    for token in rest {
        match token.to_lowercase().as_str() {
            "today" => due = Some(now.date_naive()),
            "tomorrow" => due = Some(now.date_naive() + Duration::days(1)),
            _ => title_tokens.push(token),
        }
    }

    let title = title_tokens.join(" ");
    if title.is_empty() {
        return noop("Tell me what to add, e.g. 'add buy milk tomorrow'.");
    }

    let preview = match due {
        Some(date) => format!("Create \"{title}\" due {date}"),
        None => format!("Create \"{title}\""),
    };

    CommandResponse::single(
        Action::Create {
            title,
            description: None,
            status: None,
            due_date: due.map(|date| date.format("%Y-%m-%d").to_string()),
        },
        preview,
    )
}

/// `delete|remove|rm [all | [the|task] <title>]`.
fn parse_delete(rest: &[&str]) -> CommandResponse {
    if rest.iter().any(|token| token.eq_ignore_ascii_case("all")) {
        return CommandResponse {
            actions: vec![Action::BulkDeleteAll {}],
            preview: "Delete ALL of your tasks".to_string(),
            requires_confirm: true,
            confirm_token: None,
        };
    }

    let cleaned: Vec<&str> = rest
        .iter()
        .skip_while(|token| {
            token.eq_ignore_ascii_case("the") || token.eq_ignore_ascii_case("task")
        })
        .copied()
        .collect();
    let title = cleaned.join(" ");
    if title.is_empty() {
        return noop("Tell me which task to delete, e.g. 'delete buy milk'.");
    }

    // A very short title is too vague to run without a second look.
    let requires_confirm = title.chars().count() < MIN_UNAMBIGUOUS_TITLE_LENGTH;

    CommandResponse {
        preview: format!("Delete tasks matching \"{title}\""),
        actions: vec![Action::Delete { target: TaskMatch::by_title(title), limit: None }],
        requires_confirm,
        confirm_token: None,
    }
}

/// `mark|complete|finish|done ... <status keyword> ...` — the status keyword
/// must appear somewhere in the input; the title is the text after it (or,
/// when the keyword trails the title, the text before the "as").
fn parse_mark(verb: &str, rest: &[&str]) -> CommandResponse {
    let status_at = rest.iter().position(|token| parse_status_keyword(token).is_some());

    let (status, keyword_index) = match status_at {
        Some(index) => {
            let status = parse_status_keyword(rest[index]);
            match status {
                Some(status) => (status, index),
                None => return noop(USAGE_HINT),
            }
        }
        None => {
            // "done buy milk" — the verb itself can carry the status.
            match parse_status_keyword(verb) {
                Some(status) if !rest.is_empty() => {
                    return mark_response(rest.join(" "), status);
                }
                _ => {
                    return noop(
                        "Tell me the status, e.g. 'mark buy milk as done' or \
                         'mark buy milk as pending'.",
                    )
                }
            }
        }
    };

    let after: Vec<&str> = rest[keyword_index + 1..].to_vec();
    let mut before: Vec<&str> = rest[..keyword_index].to_vec();
    if before.last().is_some_and(|token| token.eq_ignore_ascii_case("as")) {
        before.pop();
    }

    let title = if after.is_empty() { before.join(" ") } else { after.join(" ") };
    if title.is_empty() {
        return noop("Tell me which task to mark, e.g. 'mark buy milk as done'.");
    }

    mark_response(title, status)
}

fn mark_response(title: String, status: TaskStatus) -> CommandResponse {
    let preview = format!("Mark \"{title}\" as {status}");
    CommandResponse::single(
        Action::Update {
            target: TaskMatch::by_title(title),
            patch: TaskPatch { status: Some(status), ..TaskPatch::default() },
        },
        preview,
    )
}

fn parse_status_keyword(token: &str) -> Option<TaskStatus> {
    match token.to_lowercase().as_str() {
        "complete" | "completed" | "done" | "finish" | "finished" => Some(TaskStatus::Completed),
        "pending" | "incomplete" => Some(TaskStatus::Pending),
        _ => None,
    }
}

/// `rename|change <old title> to <new title>` — the literal "to" separates
/// the halves; both must be non-empty.
fn parse_rename(rest: &[&str]) -> CommandResponse {
    let Some(separator) = rest.iter().position(|token| token.eq_ignore_ascii_case("to")) else {
        return noop("Renames need a 'to', e.g. 'rename buy milk to buy oat milk'.");
    };

    let old_title = rest[..separator].join(" ");
    let new_title = rest[separator + 1..].join(" ");
    if old_title.is_empty() || new_title.is_empty() {
        return noop("Renames need both titles, e.g. 'rename buy milk to buy oat milk'.");
    }

    let preview = format!("Rename \"{old_title}\" to \"{new_title}\"");
    CommandResponse::single(
        Action::Update {
            target: TaskMatch::by_title(old_title),
            patch: TaskPatch { title: Some(new_title), ..TaskPatch::default() },
        },
        preview,
    )
}

fn mentions_due_date(rest: &[&str]) -> bool {
    rest.iter().any(|token| {
        token.eq_ignore_ascii_case("due") || token.eq_ignore_ascii_case("date")
    })
}

/// `set due [date] for|to <title> [to|for] <phrase>` — the title sits
/// between the first "for"/"to" and the date phrase; only "tomorrow",
/// "today", and "friday" are understood as date phrases.
fn parse_set_due(rest: &[&str], now: DateTime<Utc>) -> CommandResponse {
    let Some(separator) = rest
        .iter()
        .position(|token| token.eq_ignore_ascii_case("for") || token.eq_ignore_ascii_case("to"))
    else {
        return noop("Due-date changes need a 'for' or 'to', e.g. 'set due date for buy milk to friday'.");
    };

    let Some((date_position, due)) = rest
        .iter()
        .enumerate()
        .rev()
        .find_map(|(index, token)| parse_due_word(token, now).map(|date| (index, date)))
    else {
        return noop("I only understand 'today', 'tomorrow', or 'friday' as due dates here.");
    };

    if date_position <= separator {
        return noop("Tell me which task, e.g. 'set due date for buy milk to friday'.");
    }

    let mut title_tokens: Vec<&str> = rest[separator + 1..date_position]
        .iter()
        .filter(|token| {
            !token.eq_ignore_ascii_case("due") && !token.eq_ignore_ascii_case("date")
        })
        .copied()
        .collect();
    // Drop the second marker in "for <title> to <phrase>".
    if title_tokens
        .last()
        .is_some_and(|token| token.eq_ignore_ascii_case("to") || token.eq_ignore_ascii_case("for"))
    {
        title_tokens.pop();
    }
    let title = title_tokens.join(" ");
    if title.is_empty() {
        return noop("Tell me which task, e.g. 'set due date for buy milk to friday'.");
    }

    let due_text = due.format("%Y-%m-%d").to_string();
    let preview = format!("Set due date of \"{title}\" to {due_text}");
    CommandResponse::single(
        Action::Update {
            target: TaskMatch::by_title(title),
            patch: TaskPatch { due_date: Some(Some(due_text)), ..TaskPatch::default() },
        },
        preview,
    )
}

fn parse_due_word(token: &str, now: DateTime<Utc>) -> Option<chrono::NaiveDate> {
    let today = now.date_naive();
    match token.to_lowercase().as_str() {
        "today" => Some(today),
        "tomorrow" => Some(today + Duration::days(1)),
        "friday" => Some(today + Duration::days(days_until_weekday(today, Weekday::Fri))),
        _ => None,
    }
}
