//! End-to-end pipeline scenarios over in-memory ports.

mod support;

use std::sync::Arc;
use std::time::Duration;

use chrono::{Datelike, TimeZone, Utc};
use serde_json::json;
use tasklane_core::{
    ActionExecutor, CommandModel, CommandService, ConfirmationGatekeeper, FixedQuotaPolicy,
    InMemoryConfirmationStore, TaskListInvalidator, TaskStore,
};
use tasklane_domain::{Action, TaskStatus, TasklaneError};

use support::{InMemoryTaskStore, RecordingInvalidator, ScriptedModel};

struct Harness {
    store: Arc<InMemoryTaskStore>,
    invalidator: Arc<RecordingInvalidator>,
    service: CommandService,
}

fn harness() -> Harness {
    harness_with(None, Duration::from_secs(600), usize::MAX)
}

fn harness_with(
    model: Option<Arc<dyn CommandModel>>,
    ttl: Duration,
    quota: usize,
) -> Harness {
    let store = Arc::new(InMemoryTaskStore::new());
    let invalidator = Arc::new(RecordingInvalidator::new());
    let gatekeeper =
        Arc::new(ConfirmationGatekeeper::new(Arc::new(InMemoryConfirmationStore::new()), ttl));
    let executor = ActionExecutor::new(
        Arc::clone(&store) as Arc<dyn TaskStore>,
        Arc::new(FixedQuotaPolicy::new(quota)),
        Arc::clone(&invalidator) as Arc<dyn TaskListInvalidator>,
    );
    let mut service =
        CommandService::new(Arc::clone(&store) as Arc<dyn TaskStore>, executor, gatekeeper);
    if let Some(model) = model {
        service = service.with_model(model, Duration::from_secs(5));
    }
    Harness { store, invalidator, service }
}

#[tokio::test]
async fn add_command_creates_dated_task() {
    let h = harness();
    let outcome = h.service.handle_command("owner-1", "add buy milk tomorrow").await.unwrap();

    let execution = outcome.execution.unwrap();
    assert!(execution.success);
    assert_eq!(execution.affected_count, 1);

    let titles = h.store.titles("owner-1");
    assert_eq!(titles, ["buy milk"]);

    let tasks = h.store.find_by_title("owner-1", "buy milk").await.unwrap();
    let task = &tasks[0];
    let tomorrow = Utc::now().date_naive().succ_opt().unwrap();
    assert_eq!(task.due_date, Some(tomorrow));
    assert_eq!(task.due_at.map(|at| at.date_naive()), task.due_date);
    assert_eq!(h.invalidator.owners(), ["owner-1"]);
}

#[tokio::test]
async fn delete_all_round_trip() {
    let h = harness();
    h.store.seed("owner-1", "first");
    h.store.seed("owner-1", "second");
    h.store.seed("owner-2", "untouched");

    let outcome = h.service.handle_command("owner-1", "delete all").await.unwrap();
    let token = outcome.response.confirm_token.clone().unwrap();

    // Nothing deleted until the token is redeemed.
    assert!(outcome.execution.is_none());
    assert_eq!(h.store.count("owner-1").await.unwrap(), 2);
    assert!(h.invalidator.owners().is_empty());

    let execution = h.service.confirm("owner-1", &token).await.unwrap();
    assert!(execution.success);
    assert!(execution.message.contains("2 removed"));
    assert_eq!(h.store.count("owner-1").await.unwrap(), 0);
    assert_eq!(h.store.count("owner-2").await.unwrap(), 1);
}

#[tokio::test]
async fn confirmation_token_is_single_use() {
    let h = harness();
    h.store.seed("owner-1", "doomed task");

    let outcome = h.service.handle_command("owner-1", "delete doomed task").await.unwrap();
    let token = outcome.response.confirm_token.clone().unwrap();

    h.service.confirm("owner-1", &token).await.unwrap();
    let err = h.service.confirm("owner-1", &token).await.unwrap_err();
    assert_eq!(err.to_string(), "Confirmation expired, please retry");
}

#[tokio::test]
async fn expired_token_fails_like_unknown() {
    let h = harness_with(None, Duration::ZERO, usize::MAX);
    h.store.seed("owner-1", "doomed task");

    let outcome = h.service.handle_command("owner-1", "delete doomed task").await.unwrap();
    let token = outcome.response.confirm_token.clone().unwrap();

    let expired = h.service.confirm("owner-1", &token).await.unwrap_err();
    let unknown = h.service.confirm("owner-1", "bogus").await.unwrap_err();
    assert_eq!(expired.to_string(), unknown.to_string());
    assert_eq!(h.store.count("owner-1").await.unwrap(), 1);
}

#[tokio::test]
async fn foreign_token_cannot_be_redeemed() {
    let h = harness();
    h.store.seed("owner-1", "private task");

    let outcome = h.service.handle_command("owner-1", "delete private task").await.unwrap();
    let token = outcome.response.confirm_token.clone().unwrap();

    let err = h.service.confirm("owner-2", &token).await.unwrap_err();
    assert!(matches!(err, TasklaneError::ConfirmationExpired));
    assert_eq!(h.store.count("owner-1").await.unwrap(), 1);
}

#[tokio::test]
async fn ambiguous_delete_is_rejected_before_parking() {
    let h = harness();
    h.store.seed("owner-1", "gym");
    h.store.seed("owner-1", "gym class");

    let err = h.service.handle_command("owner-1", "delete gym").await.unwrap_err();
    match err {
        TasklaneError::Ambiguity { query, candidates } => {
            assert_eq!(query, "gym");
            assert_eq!(candidates.len(), 2);
            assert!(candidates.contains(&"gym class".to_string()));
        }
        other => panic!("expected ambiguity, got {other:?}"),
    }
    assert_eq!(h.store.count("owner-1").await.unwrap(), 2);
    assert!(h.invalidator.owners().is_empty());
}

#[tokio::test]
async fn mark_done_advances_recurring_task() {
    let h = harness();
    // 2026-01-12 is a Monday.
    let due = Utc.with_ymd_and_hms(2026, 1, 12, 9, 0, 0).unwrap();
    let id = h.store.seed_task("owner-1", "weekly standup", Some(due), Some("WEEKLY:MO:09:00"));

    let outcome =
        h.service.handle_command("owner-1", "mark weekly standup as done").await.unwrap();
    assert!(outcome.execution.unwrap().success);

    let task = h.store.get(id).unwrap();
    assert_eq!(task.status, TaskStatus::Pending);
    assert_eq!(task.due_at, Some(Utc.with_ymd_and_hms(2026, 1, 19, 9, 0, 0).unwrap()));
    assert_eq!(task.due_at.unwrap().weekday(), chrono::Weekday::Mon);
}

#[tokio::test]
async fn quota_blocks_creation_through_pipeline() {
    let h = harness_with(None, Duration::from_secs(600), 1);
    h.store.seed("owner-1", "existing");

    let outcome = h.service.handle_command("owner-1", "add one more").await.unwrap();
    let execution = outcome.execution.unwrap();
    assert!(!execution.success);
    assert!(execution.message.contains("limit"));
    assert_eq!(h.store.count("owner-1").await.unwrap(), 1);
}

#[tokio::test]
async fn model_clears_due_date_with_null_patch() {
    let due = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
    let payload = json!({
        "actions": [{
            "type": "update",
            "match": {"title": "report"},
            "patch": {"dueDate": null}
        }],
        "preview": "Clear the due date of \"report\"",
        "requiresConfirm": false
    });
    let h = harness_with(
        Some(Arc::new(ScriptedModel::responding(payload))),
        Duration::from_secs(600),
        usize::MAX,
    );
    let id = h.store.seed_task("owner-1", "report", Some(due), None);

    let outcome =
        h.service.handle_command("owner-1", "remove the due date from report").await.unwrap();
    assert!(outcome.execution.unwrap().success);

    let task = h.store.get(id).unwrap();
    assert_eq!(task.due_at, None);
    assert_eq!(task.due_date, None);
}

#[tokio::test]
async fn invalid_model_output_falls_back_to_rules() {
    let payload = json!({"actions": "not an array", "preview": 5});
    let h = harness_with(
        Some(Arc::new(ScriptedModel::responding(payload))),
        Duration::from_secs(600),
        usize::MAX,
    );

    let outcome = h.service.handle_command("owner-1", "add buy milk").await.unwrap();
    assert!(outcome.execution.unwrap().success);
    assert_eq!(h.store.titles("owner-1"), ["buy milk"]);
}

#[tokio::test]
async fn model_network_failure_falls_back_to_rules() {
    let h = harness_with(
        Some(Arc::new(ScriptedModel::failing("connection reset"))),
        Duration::from_secs(600),
        usize::MAX,
    );

    let outcome = h.service.handle_command("owner-1", "add buy milk").await.unwrap();
    assert!(outcome.execution.unwrap().success);
    assert_eq!(h.store.titles("owner-1"), ["buy milk"]);
}

#[tokio::test]
async fn model_destructive_proposal_still_needs_confirmation() {
    // Model omits requiresConfirm entirely; the pipeline recomputes it.
    let payload = json!({
        "actions": [{"type": "bulk_delete_all"}],
        "preview": "Delete ALL tasks"
    });
    let h = harness_with(
        Some(Arc::new(ScriptedModel::responding(payload))),
        Duration::from_secs(600),
        usize::MAX,
    );
    h.store.seed("owner-1", "kept until confirmed");

    let outcome = h.service.handle_command("owner-1", "wipe everything").await.unwrap();
    assert!(outcome.response.requires_confirm);
    assert!(outcome.response.confirm_token.is_some());
    assert!(outcome.execution.is_none());
    assert_eq!(h.store.count("owner-1").await.unwrap(), 1);
}

#[tokio::test]
async fn multi_action_model_batch_applies_in_order() {
    let payload = json!({
        "actions": [
            {"type": "create", "title": "plan trip"},
            {"type": "update", "match": {"title": "plan trip"}, "patch": {"description": "book flights first"}},
            {"type": "noop", "reason": "third clause not understood"}
        ],
        "preview": "Create and annotate \"plan trip\"",
        "requiresConfirm": false
    });
    let h = harness_with(
        Some(Arc::new(ScriptedModel::responding(payload))),
        Duration::from_secs(600),
        usize::MAX,
    );

    let outcome = h.service.handle_command("owner-1", "plan a trip").await.unwrap();
    let execution = outcome.execution.unwrap();
    assert!(execution.success);
    assert_eq!(execution.affected_count, 2);
    assert!(execution.message.contains("third clause not understood"));

    let tasks = h.store.find_by_title("owner-1", "plan trip").await.unwrap();
    assert_eq!(tasks[0].description.as_deref(), Some("book flights first"));
}

#[tokio::test]
async fn failing_action_aborts_rest_of_batch() {
    let payload = json!({
        "actions": [
            {"type": "create", "title": "first"},
            {"type": "update", "match": {"title": "no such task"}, "patch": {"status": "completed"}},
            {"type": "create", "title": "never created"}
        ],
        "preview": "Three steps",
        "requiresConfirm": false
    });
    let h = harness_with(
        Some(Arc::new(ScriptedModel::responding(payload))),
        Duration::from_secs(600),
        usize::MAX,
    );

    let outcome = h.service.handle_command("owner-1", "do three things").await.unwrap();
    let execution = outcome.execution.unwrap();
    assert!(!execution.success);
    assert_eq!(execution.affected_count, 1);
    assert_eq!(h.store.titles("owner-1"), ["first"]);
}

#[tokio::test]
async fn rename_command_updates_title() {
    let h = harness();
    let id = h.store.seed("owner-1", "buy milk");

    let outcome =
        h.service.handle_command("owner-1", "rename buy milk to buy oat milk").await.unwrap();
    assert!(outcome.execution.unwrap().success);
    assert_eq!(h.store.get(id).unwrap().title, "buy oat milk");
}

#[tokio::test]
async fn unparseable_command_is_a_successful_noop() {
    let h = harness();
    let outcome = h.service.handle_command("owner-1", "sing me a song").await.unwrap();

    let execution = outcome.execution.unwrap();
    assert!(execution.success);
    assert_eq!(execution.affected_count, 0);
    assert!(matches!(outcome.response.actions.as_slice(), [Action::Noop { .. }]));
    assert!(h.invalidator.owners().is_empty());
}
