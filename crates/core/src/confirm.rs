//! Confirmation gatekeeper.
//!
//! Decides whether a batch of actions needs explicit user confirmation,
//! rejects ambiguous destructive matches up front, and manages single-use,
//! time-boxed confirmation tokens.
//!
//! State machine per batch:
//! `Proposed -> {AutoExecute | AwaitingConfirmation -> {Confirmed -> Executed | Expired | Cancelled}}`

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tasklane_domain::constants::AMBIGUITY_CANDIDATE_LIMIT;
use tasklane_domain::{Action, PendingConfirmation, Result, TasklaneError};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::ports::{ConfirmationStore, TaskStore};

/// True iff the batch contains at least one destructive action.
///
/// This is the single source of truth for the confirm-or-not decision; it
/// is always recomputed server-side, never trusted from client input.
pub fn requires_confirm(actions: &[Action]) -> bool {
    actions.iter().any(Action::is_destructive)
}

/// In-memory [`ConfirmationStore`] backed by a concurrent map.
///
/// `DashMap::remove` gives the atomic check-and-delete-on-read that keeps
/// tokens single-use under concurrent redemption attempts. Single-process
/// only; multi-instance deployments need a shared keyed store with per-key
/// expiry instead.
#[derive(Default)]
pub struct InMemoryConfirmationStore {
    entries: DashMap<String, PendingConfirmation>,
}

impl InMemoryConfirmationStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pending confirmations currently held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no confirmations are pending.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ConfirmationStore for InMemoryConfirmationStore {
    fn insert(&self, pending: PendingConfirmation) {
        self.entries.insert(pending.token.clone(), pending);
    }

    fn take(&self, token: &str) -> Option<PendingConfirmation> {
        self.entries.remove(token).map(|(_, pending)| pending)
    }

    fn sweep_expired(&self, ttl: Duration, now: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, pending| {
            now.signed_duration_since(pending.created_at).to_std().is_ok_and(|age| age <= ttl)
                || pending.created_at > now
        });
        before - self.entries.len()
    }
}

/// Gates destructive batches behind a one-time confirmation handshake.
pub struct ConfirmationGatekeeper {
    store: Arc<dyn ConfirmationStore>,
    ttl: Duration,
}

impl ConfirmationGatekeeper {
    /// Create a gatekeeper over the given token store with the given TTL.
    pub fn new(store: Arc<dyn ConfirmationStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// Reject batches containing an ambiguous delete-by-title.
    ///
    /// An ambiguous delete is always unsafe to auto-execute, so this check
    /// runs even when the batch would not otherwise require confirmation.
    ///
    /// # Errors
    /// Returns `TasklaneError::Ambiguity` naming up to five candidate
    /// titles when more than one task matches a delete's title text.
    pub async fn ensure_unambiguous(
        &self,
        tasks: &dyn TaskStore,
        owner: &str,
        actions: &[Action],
    ) -> Result<()> {
        for action in actions {
            let Action::Delete { target, .. } = action else { continue };
            if target.id.is_some() {
                continue;
            }
            let Some(title) = target.title.as_deref() else { continue };

            let matches = tasks.find_by_title_substring(owner, title).await?;
            if matches.len() > 1 {
                let candidates: Vec<String> = matches
                    .iter()
                    .take(AMBIGUITY_CANDIDATE_LIMIT)
                    .map(|task| task.title.clone())
                    .collect();
                warn!(owner, query = title, count = matches.len(), "ambiguous delete rejected");
                return Err(TasklaneError::Ambiguity { query: title.to_string(), candidates });
            }
        }
        Ok(())
    }

    /// Mint a token for a destructive batch and park it until confirmed.
    pub fn issue(&self, owner: &str, actions: Vec<Action>, preview: String) -> String {
        let token = Uuid::new_v4().to_string();
        self.store.insert(PendingConfirmation {
            token: token.clone(),
            owner_id: owner.to_string(),
            actions,
            preview,
            created_at: Utc::now(),
        });
        info!(owner, "confirmation token issued");
        token
    }

    /// Redeem a token. Returns the parked batch, or `None` when the token
    /// is unknown, already used, expired, or owned by someone else — all
    /// four causes fail identically.
    ///
    /// The entry is removed atomically on lookup, so a token can be
    /// redeemed at most once; a mismatched or stale entry stays consumed.
    pub fn redeem(&self, token: &str, owner: &str) -> Option<(Vec<Action>, String)> {
        let pending = self.store.take(token)?;

        if pending.owner_id != owner {
            warn!(owner, "confirmation token owner mismatch");
            return None;
        }

        let age = Utc::now().signed_duration_since(pending.created_at).to_std().ok()?;
        if age > self.ttl {
            debug!(owner, "confirmation token expired at redemption");
            return None;
        }

        info!(owner, "confirmation token redeemed");
        Some((pending.actions, pending.preview))
    }

    /// Purge expired entries once. The reaper calls this periodically.
    pub fn sweep(&self) -> usize {
        let purged = self.store.sweep_expired(self.ttl, Utc::now());
        if purged > 0 {
            debug!(purged, "swept expired confirmation tokens");
        }
        purged
    }

    /// Spawn the background reaper, bounding memory growth by purging
    /// entries older than the TTL whether or not they were ever redeemed.
    pub fn spawn_reaper(self: &Arc<Self>, interval: Duration) -> tokio::task::JoinHandle<()> {
        let gatekeeper = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                gatekeeper.sweep();
            }
        })
    }
}
