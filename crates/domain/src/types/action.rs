//! Typed mutation intents and the command response envelope.
//!
//! An [`Action`] is the unit of work produced by the command parsers and
//! consumed by the executor. The enum is a closed tagged union; exhaustive
//! matching in the executor guarantees no action kind is silently ignored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Completed,
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

/// Identifies the task an update or delete applies to.
///
/// Invariant: at least one of `id` and `title` must be set. Enforced by
/// [`crate::validation::validate_actions`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskMatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl TaskMatch {
    /// Match by exact id.
    pub fn by_id(id: Uuid) -> Self {
        Self { id: Some(id), title: None }
    }

    /// Match by title text.
    pub fn by_title(title: impl Into<String>) -> Self {
        Self { id: None, title: Some(title.into()) }
    }
}

/// Fields to change on a matched task. Only present fields are applied.
///
/// `due_date` is three-state: absent leaves the due date untouched, an
/// explicit `null` clears both the due instant and its date projection, and
/// a string value is resolved through the date normalizer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_with::rust::double_option"
    )]
    pub due_date: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence_rule: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence_timezone: Option<String>,
}

impl TaskPatch {
    /// True when no field would change.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.due_date.is_none()
            && self.recurrence_rule.is_none()
            && self.recurrence_timezone.is_none()
    }
}

/// A validated, typed mutation intent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum Action {
    Create {
        title: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        status: Option<TaskStatus>,
        /// Raw date input, resolved by the executor through the three-tier
        /// date normalizer. Unparseable input leaves the task undated.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        due_date: Option<String>,
    },
    Update {
        #[serde(rename = "match")]
        target: TaskMatch,
        patch: TaskPatch,
    },
    Delete {
        #[serde(rename = "match")]
        target: TaskMatch,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        limit: Option<u32>,
    },
    BulkDeleteAll {},
    Noop {
        reason: String,
    },
}

impl Action {
    /// True for actions that destroy data and therefore require explicit
    /// user confirmation before execution.
    pub fn is_destructive(&self) -> bool {
        matches!(self, Self::Delete { .. } | Self::BulkDeleteAll {})
    }
}

/// Result of the parse step, surfaced to the caller.
///
/// Invariant: `confirm_token` is present iff `requires_confirm` is true for
/// at least one destructive action in the batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResponse {
    pub actions: Vec<Action>,
    pub preview: String,
    pub requires_confirm: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirm_token: Option<String>,
}

impl CommandResponse {
    /// A response holding a single action and no confirmation requirement.
    pub fn single(action: Action, preview: impl Into<String>) -> Self {
        Self {
            actions: vec![action],
            preview: preview.into(),
            requires_confirm: false,
            confirm_token: None,
        }
    }
}

/// A destructive batch parked until the user confirms it.
///
/// Owned by the confirmation store. Consumed on first successful lookup by
/// the same owner; purged after the TTL even if unused.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingConfirmation {
    pub token: String,
    pub owner_id: String,
    pub actions: Vec<Action>,
    pub preview: String,
    pub created_at: DateTime<Utc>,
}

/// Result of the execute step.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionOutcome {
    pub success: bool,
    pub message: String,
    pub affected_count: usize,
}

/// Combined result of handling one command: the parse response plus the
/// execution outcome when the batch ran immediately (no confirmation
/// required).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandOutcome {
    pub response: CommandResponse,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution: Option<ExecutionOutcome>,
}
