//! Port interfaces for the command pipeline
//!
//! These traits define the boundaries between core business logic
//! and infrastructure implementations.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tasklane_domain::{NewTask, PendingConfirmation, Result, Task};
use uuid::Uuid;

/// Trait for the record-oriented task store.
///
/// Every call is scoped to the caller's owner id — the core never issues an
/// unscoped query. Title lookups come in three flavors because the matcher
/// evaluates them as successive fallback tiers.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Find a task by id, constrained to the owner.
    async fn find_by_id(&self, owner: &str, id: Uuid) -> Result<Option<Task>>;

    /// Find tasks whose title equals `title` exactly (case-sensitive).
    async fn find_by_title(&self, owner: &str, title: &str) -> Result<Vec<Task>>;

    /// Find tasks whose title equals `title` ignoring case.
    async fn find_by_title_ci(&self, owner: &str, title: &str) -> Result<Vec<Task>>;

    /// Find tasks whose title contains `fragment` ignoring case.
    async fn find_by_title_substring(&self, owner: &str, fragment: &str) -> Result<Vec<Task>>;

    /// Insert a new task, returning the stored record.
    async fn insert(&self, task: NewTask) -> Result<Task>;

    /// Replace a stored task (last-write-wins).
    async fn update(&self, task: Task) -> Result<()>;

    /// Delete the given tasks, returning how many rows were removed.
    async fn delete(&self, owner: &str, ids: &[Uuid]) -> Result<usize>;

    /// Delete every task owned by `owner`, returning the row count.
    async fn delete_all(&self, owner: &str) -> Result<usize>;

    /// Count tasks owned by `owner`.
    async fn count(&self, owner: &str) -> Result<usize>;
}

/// Trait for plan-limit enforcement on task creation.
pub trait QuotaPolicy: Send + Sync {
    /// Check whether `owner` may create another task given their current
    /// task count.
    ///
    /// # Errors
    /// Returns `TasklaneError::Quota` carrying the limit and current count.
    fn check_create(&self, owner: &str, current: usize) -> Result<()>;
}

/// Trait for downstream cache/view invalidation.
///
/// The executor emits this signal after every successful mutation; what the
/// signal reaches (view caches, subscriptions) is an infrastructure concern.
pub trait TaskListInvalidator: Send + Sync {
    /// Invalidate cached views of `owner`'s task list.
    fn invalidate(&self, owner: &str);
}

/// Trait for the optional external language model.
///
/// The model is an untrusted, possibly-unavailable oracle: its output must
/// pass action-batch validation before use, and any failure sends the
/// pipeline back to the rule-based parser.
#[async_trait]
pub trait CommandModel: Send + Sync {
    /// Ask the model to turn `input` into a command response JSON object.
    async fn propose(&self, system_prompt: &str, input: &str) -> Result<serde_json::Value>;
}

/// Trait for the confirmation token store — the only shared mutable state
/// in the pipeline.
///
/// `take` must be atomic (check-existence and delete-on-read as one step) so
/// tokens stay single-use under concurrent redemption. In a multi-instance
/// deployment this store must be backed by a shared keyed store with
/// per-key expiry; the in-memory implementation is single-process only.
pub trait ConfirmationStore: Send + Sync {
    /// Store a pending confirmation keyed by its token.
    fn insert(&self, pending: PendingConfirmation);

    /// Atomically remove and return the entry for `token`, if present.
    fn take(&self, token: &str) -> Option<PendingConfirmation>;

    /// Purge entries older than `ttl` as of `now`, returning how many were
    /// removed.
    fn sweep_expired(&self, ttl: Duration, now: DateTime<Utc>) -> usize;
}
