//! Action executor.
//!
//! Applies a validated action batch in order against the task store. The
//! batch is not transactional: the first failure aborts execution, nothing
//! after the failing action runs, and the outcome reports how many actions
//! were applied before the abort.

use std::sync::Arc;

use chrono::Utc;
use tasklane_domain::constants::{
    AMBIGUITY_CANDIDATE_LIMIT, DEFAULT_RECURRENCE_TIMEZONE, DEFAULT_TASK_QUOTA,
};
use tasklane_domain::validation::validate_actions;
use tasklane_domain::{
    Action, ExecutionOutcome, NewTask, Result, Task, TaskMatch, TaskPatch, TaskStatus,
    TasklaneError,
};
use tracing::{debug, info, warn};

use crate::datetime::{project_date, resolve_date_input};
use crate::matching::resolve_matches;
use crate::ports::{QuotaPolicy, TaskListInvalidator, TaskStore};
use crate::recurrence::next_occurrence_for_rule;

/// Quota policy with a single fixed per-owner limit.
pub struct FixedQuotaPolicy {
    limit: usize,
}

impl FixedQuotaPolicy {
    pub fn new(limit: usize) -> Self {
        Self { limit }
    }
}

impl Default for FixedQuotaPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_TASK_QUOTA)
    }
}

impl QuotaPolicy for FixedQuotaPolicy {
    fn check_create(&self, owner: &str, current: usize) -> Result<()> {
        if current >= self.limit {
            warn!(owner, current, limit = self.limit, "task quota reached");
            return Err(TasklaneError::Quota { limit: self.limit, current });
        }
        Ok(())
    }
}

/// Invalidator that drops the signal. Used when no view cache exists.
#[derive(Default)]
pub struct NoopInvalidator;

impl TaskListInvalidator for NoopInvalidator {
    fn invalidate(&self, _owner: &str) {}
}

/// Executes validated action batches against the task store.
pub struct ActionExecutor {
    store: Arc<dyn TaskStore>,
    quota: Arc<dyn QuotaPolicy>,
    invalidator: Arc<dyn TaskListInvalidator>,
}

impl ActionExecutor {
    pub fn new(
        store: Arc<dyn TaskStore>,
        quota: Arc<dyn QuotaPolicy>,
        invalidator: Arc<dyn TaskListInvalidator>,
    ) -> Self {
        Self { store, quota, invalidator }
    }

    /// Execute a batch in order, aborting at the first failure.
    ///
    /// The outcome's `affected_count` sums the per-action counts of the
    /// actions that completed. A batch that fails structural validation
    /// executes nothing.
    pub async fn execute(&self, owner: &str, actions: &[Action]) -> ExecutionOutcome {
        if let Err(err) = validate_actions(actions) {
            return ExecutionOutcome { success: false, message: err.to_string(), affected_count: 0 };
        }

        let mut affected = 0;
        let mut messages = Vec::with_capacity(actions.len());

        for action in actions {
            match self.apply(owner, action).await {
                Ok((message, count)) => {
                    affected += count;
                    messages.push(message);
                    if !matches!(action, Action::Noop { .. }) {
                        self.invalidator.invalidate(owner);
                    }
                }
                Err(err) => {
                    warn!(owner, applied = affected, error = %err, "batch aborted");
                    return ExecutionOutcome {
                        success: false,
                        message: err.to_string(),
                        affected_count: affected,
                    };
                }
            }
        }

        info!(owner, affected, "batch executed");
        ExecutionOutcome { success: true, message: messages.join(". "), affected_count: affected }
    }

    async fn apply(&self, owner: &str, action: &Action) -> Result<(String, usize)> {
        match action {
            Action::Create { title, description, status, due_date } => {
                self.apply_create(owner, title, description.as_deref(), *status, due_date.as_deref())
                    .await
            }
            Action::Update { target, patch } => self.apply_update(owner, target, patch).await,
            Action::Delete { target, limit } => self.apply_delete(owner, target, *limit).await,
            Action::BulkDeleteAll {} => self.apply_bulk_delete(owner).await,
            Action::Noop { reason } => Ok((reason.clone(), 0)),
        }
    }

    async fn apply_create(
        &self,
        owner: &str,
        title: &str,
        description: Option<&str>,
        status: Option<TaskStatus>,
        due_date: Option<&str>,
    ) -> Result<(String, usize)> {
        let current = self.store.count(owner).await?;
        self.quota.check_create(owner, current)?;

        // An unresolvable date phrase leaves the task undated rather than
        // failing the create.
        let due_at = due_date.and_then(|raw| {
            let resolved = resolve_date_input(raw, Utc::now());
            if resolved.is_none() {
                debug!(owner, raw, "unresolvable due date ignored on create");
            }
            resolved
        });

        let task = self
            .store
            .insert(NewTask {
                owner_id: owner.to_string(),
                title: title.to_string(),
                description: description.map(str::to_string),
                status: status.unwrap_or(TaskStatus::Pending),
                due_at,
                due_date: due_at.map(project_date),
                recurrence_rule: None,
                recurrence_timezone: None,
            })
            .await?;

        Ok((format!("Created \"{}\"", task.title), 1))
    }

    async fn apply_update(
        &self,
        owner: &str,
        target: &TaskMatch,
        patch: &TaskPatch,
    ) -> Result<(String, usize)> {
        let mut task = self.resolve_single(owner, target).await?;

        if let Some(title) = &patch.title {
            task.title = title.clone();
        }
        if let Some(description) = &patch.description {
            task.description = Some(description.clone());
        }
        match &patch.due_date {
            None => {}
            // Explicit null clears the instant and its projection together.
            Some(None) => {
                task.due_at = None;
                task.due_date = None;
            }
            Some(Some(raw)) => {
                // An unresolvable value leaves the existing due date alone.
                if let Some(instant) = resolve_date_input(raw, Utc::now()) {
                    task.due_at = Some(instant);
                    task.due_date = Some(project_date(instant));
                } else {
                    debug!(owner, raw, "unresolvable due date ignored on update");
                }
            }
        }
        if let Some(rule) = &patch.recurrence_rule {
            task.recurrence_rule = Some(rule.clone());
            if task.recurrence_timezone.is_none() {
                task.recurrence_timezone = Some(DEFAULT_RECURRENCE_TIMEZONE.to_string());
            }
        }
        if let Some(timezone) = &patch.recurrence_timezone {
            task.recurrence_timezone = Some(timezone.clone());
        }
        if let Some(status) = patch.status {
            self.apply_status(&mut task, status);
        }

        task.updated_at = Utc::now();
        let title = task.title.clone();
        self.store.update(task).await?;
        Ok((format!("Updated \"{title}\""), 1))
    }

    /// Completing a recurring task rolls it forward instead of closing it:
    /// the due instant advances to the next occurrence and the status stays
    /// pending. Non-recurring tasks (or rules that fail to parse or produce
    /// no occurrence) complete normally.
    fn apply_status(&self, task: &mut Task, status: TaskStatus) {
        if status == TaskStatus::Completed {
            if let Some(rule) = task.recurrence_rule.as_deref() {
                let from = task.due_at.unwrap_or_else(Utc::now);
                if let Some(next) = next_occurrence_for_rule(rule, from) {
                    debug!(task = %task.id, next = %next, "recurring task advanced");
                    task.due_at = Some(next);
                    task.due_date = Some(project_date(next));
                    task.status = TaskStatus::Pending;
                    return;
                }
            }
        }
        task.status = status;
    }

    async fn apply_delete(
        &self,
        owner: &str,
        target: &TaskMatch,
        limit: Option<u32>,
    ) -> Result<(String, usize)> {
        let mut matches = resolve_matches(self.store.as_ref(), owner, target).await?;
        if matches.is_empty() {
            return Err(TasklaneError::NotFound(not_found_text(target)));
        }
        if matches.len() > 1 && target.id.is_none() {
            return Err(ambiguity_error(target, &matches));
        }
        if let Some(limit) = limit {
            matches.truncate(limit as usize);
        }

        let ids: Vec<_> = matches.iter().map(|task| task.id).collect();
        let removed = self.store.delete(owner, &ids).await?;
        let titles: Vec<_> = matches.iter().map(|task| format!("\"{}\"", task.title)).collect();
        Ok((format!("Deleted {}", titles.join(", ")), removed))
    }

    /// Bulk deletion counts as one action regardless of how many rows it
    /// removes; the row count only appears in the message.
    async fn apply_bulk_delete(&self, owner: &str) -> Result<(String, usize)> {
        let removed = self.store.delete_all(owner).await?;
        Ok((format!("Deleted all tasks ({removed} removed)"), 1))
    }

    async fn resolve_single(&self, owner: &str, target: &TaskMatch) -> Result<Task> {
        let matches = resolve_matches(self.store.as_ref(), owner, target).await?;
        match matches.len() {
            0 => Err(TasklaneError::NotFound(not_found_text(target))),
            1 => Ok(matches.into_iter().next().ok_or_else(|| {
                TasklaneError::Internal("match vanished during resolution".to_string())
            })?),
            _ => Err(ambiguity_error(target, &matches)),
        }
    }
}

fn not_found_text(target: &TaskMatch) -> String {
    match (&target.id, &target.title) {
        (Some(id), _) => format!("no task with id {id}"),
        (None, Some(title)) => format!("no task matching \"{title}\""),
        (None, None) => "no task matches".to_string(),
    }
}

fn ambiguity_error(target: &TaskMatch, matches: &[Task]) -> TasklaneError {
    TasklaneError::Ambiguity {
        query: target.title.clone().unwrap_or_default(),
        candidates: matches
            .iter()
            .take(AMBIGUITY_CANDIDATE_LIMIT)
            .map(|task| task.title.clone())
            .collect(),
    }
}
