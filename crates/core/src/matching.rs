//! Three-tier fuzzy title matching.
//!
//! Title lookups are an ordered list of matcher strategies evaluated until
//! one yields a non-empty result set: exact match, then case-insensitive
//! exact, then case-insensitive substring. Each tier keeps its own query
//! semantics so it stays independently testable.

use tasklane_domain::{Result, Task, TaskMatch, TasklaneError};
use tracing::debug;

use crate::ports::TaskStore;

/// Resolve a [`TaskMatch`] to the owner's candidate tasks.
///
/// An id match is exact and returns at most one task. A title match walks
/// the tiers in order and returns the first non-empty result set — possibly
/// more than one task; disambiguation is the caller's concern.
///
/// # Errors
/// Returns `TasklaneError::Validation` when the match carries neither key,
/// or any store error.
pub async fn resolve_matches(
    store: &dyn TaskStore,
    owner: &str,
    target: &TaskMatch,
) -> Result<Vec<Task>> {
    if let Some(id) = target.id {
        return Ok(store.find_by_id(owner, id).await?.into_iter().collect());
    }

    let Some(title) = target.title.as_deref().map(str::trim).filter(|t| !t.is_empty()) else {
        return Err(TasklaneError::Validation("match must carry a task id or a title".to_string()));
    };

    let found = exact_title(store, owner, title).await?;
    if !found.is_empty() {
        debug!(tier = "exact", count = found.len(), "title match resolved");
        return Ok(found);
    }

    let found = case_insensitive_title(store, owner, title).await?;
    if !found.is_empty() {
        debug!(tier = "case-insensitive", count = found.len(), "title match resolved");
        return Ok(found);
    }

    let found = substring_title(store, owner, title).await?;
    if !found.is_empty() {
        debug!(tier = "substring", count = found.len(), "title match resolved");
    }
    Ok(found)
}

/// Tier 1: exact, case-sensitive title equality.
pub async fn exact_title(store: &dyn TaskStore, owner: &str, title: &str) -> Result<Vec<Task>> {
    store.find_by_title(owner, title).await
}

/// Tier 2: case-insensitive title equality.
pub async fn case_insensitive_title(
    store: &dyn TaskStore,
    owner: &str,
    title: &str,
) -> Result<Vec<Task>> {
    store.find_by_title_ci(owner, title).await
}

/// Tier 3: case-insensitive substring containment.
pub async fn substring_title(store: &dyn TaskStore, owner: &str, title: &str) -> Result<Vec<Task>> {
    store.find_by_title_substring(owner, title).await
}
