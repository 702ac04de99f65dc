//! Command pipeline facade.
//!
//! Wires the parsers, the confirmation gatekeeper, and the executor into the
//! two entry points callers use: [`CommandService::handle_command`] for a
//! fresh natural-language command and [`CommandService::confirm`] for
//! redeeming a previously issued confirmation token.

use std::sync::Arc;
use std::time::Duration;

use tasklane_domain::constants::DEFAULT_MODEL_TIMEOUT_SECS;
use tasklane_domain::validation::{validate_actions, validate_command_payload};
use tasklane_domain::{CommandOutcome, CommandResponse, ExecutionOutcome, Result, TasklaneError};
use tracing::{debug, info, warn};

use crate::confirm::{requires_confirm, ConfirmationGatekeeper};
use crate::executor::ActionExecutor;
use crate::parser::RuleBasedParser;
use crate::ports::{CommandModel, TaskStore};

/// Instructions sent to the language model. The model's output is untrusted
/// and must pass [`validate_command_payload`] before anything acts on it.
const SYSTEM_PROMPT: &str = r#"You translate task-management commands into a JSON object.

Respond with ONLY a JSON object of this shape:
{
  "actions": [ ...one or more actions... ],
  "preview": "short human-readable summary of what will happen",
  "requiresConfirm": true | false
}

Action kinds:
- {"type": "create", "title": "...", "description": "...?", "status": "pending|completed"?, "dueDate": "...?"}
- {"type": "update", "match": {"id": "...?" , "title": "...?"}, "patch": {"title"?, "description"?, "status"?, "dueDate"?: string|null, "recurrenceRule"?, "recurrenceTimezone"?}}
- {"type": "delete", "match": {"id": "...?", "title": "...?"}, "limit"?: number}
- {"type": "bulk_delete_all"}
- {"type": "noop", "reason": "why no change will be made"}

Rules:
- Titles are at most 120 characters, descriptions at most 500.
- "dueDate" may be an ISO instant, a YYYY-MM-DD date, or a natural phrase
  like "tomorrow" or "friday at 5pm"; pass the user's wording through.
- Setting "dueDate" to null in an update patch clears the due date.
- Use "noop" with a clear reason for anything you cannot express as the
  other action kinds. Never invent tasks the user did not mention.
- Set "requiresConfirm" to true when any action deletes data.

Examples:
User: add buy milk tomorrow
{"actions":[{"type":"create","title":"buy milk","dueDate":"tomorrow"}],"preview":"Create \"buy milk\" due tomorrow","requiresConfirm":false}

User: mark buy milk as done
{"actions":[{"type":"update","match":{"title":"buy milk"},"patch":{"status":"completed"}}],"preview":"Complete \"buy milk\"","requiresConfirm":false}

User: delete all my tasks
{"actions":[{"type":"bulk_delete_all"}],"preview":"Delete ALL tasks","requiresConfirm":true}

User: what's the weather
{"actions":[{"type":"noop","reason":"This is not a task command"}],"preview":"No changes","requiresConfirm":false}"#;

/// Orchestrates parse, gate, and execute for one owner's commands.
pub struct CommandService {
    store: Arc<dyn TaskStore>,
    executor: ActionExecutor,
    gatekeeper: Arc<ConfirmationGatekeeper>,
    parser: RuleBasedParser,
    model: Option<Arc<dyn CommandModel>>,
    model_timeout: Duration,
}

impl CommandService {
    /// A service without a language model; every command goes through the
    /// rule-based parser.
    pub fn new(
        store: Arc<dyn TaskStore>,
        executor: ActionExecutor,
        gatekeeper: Arc<ConfirmationGatekeeper>,
    ) -> Self {
        Self {
            store,
            executor,
            gatekeeper,
            parser: RuleBasedParser,
            model: None,
            model_timeout: Duration::from_secs(DEFAULT_MODEL_TIMEOUT_SECS),
        }
    }

    /// Attach a language model as the primary parser. The rule-based parser
    /// remains the fallback for model failures and timeouts.
    pub fn with_model(mut self, model: Arc<dyn CommandModel>, timeout: Duration) -> Self {
        self.model = Some(model);
        self.model_timeout = timeout;
        self
    }

    /// Handle one natural-language command.
    ///
    /// Non-destructive batches execute immediately and the outcome carries
    /// their execution result. Destructive batches are parked behind a
    /// confirmation token instead; nothing is deleted until the token is
    /// redeemed via [`Self::confirm`].
    ///
    /// # Errors
    /// Returns `TasklaneError::Validation` for a structurally invalid batch
    /// and `TasklaneError::Ambiguity` when a delete-by-title matches more
    /// than one task.
    pub async fn handle_command(&self, owner: &str, input: &str) -> Result<CommandOutcome> {
        let parsed = self.parse(input).await;
        validate_actions(&parsed.actions)?;

        // The confirmation flag is always recomputed from the actions;
        // whatever the model claimed is discarded.
        let destructive = requires_confirm(&parsed.actions);
        self.gatekeeper.ensure_unambiguous(self.store.as_ref(), owner, &parsed.actions).await?;

        if destructive {
            let token =
                self.gatekeeper.issue(owner, parsed.actions.clone(), parsed.preview.clone());
            info!(owner, "destructive batch parked for confirmation");
            return Ok(CommandOutcome {
                response: CommandResponse {
                    actions: parsed.actions,
                    preview: parsed.preview,
                    requires_confirm: true,
                    confirm_token: Some(token),
                },
                execution: None,
            });
        }

        let execution = self.executor.execute(owner, &parsed.actions).await;
        Ok(CommandOutcome {
            response: CommandResponse {
                actions: parsed.actions,
                preview: parsed.preview,
                requires_confirm: false,
                confirm_token: None,
            },
            execution: Some(execution),
        })
    }

    /// Redeem a confirmation token and execute the parked batch.
    ///
    /// # Errors
    /// Returns `TasklaneError::ConfirmationExpired` for an unknown, used,
    /// expired, or foreign token. The message never distinguishes which.
    pub async fn confirm(&self, owner: &str, token: &str) -> Result<ExecutionOutcome> {
        let Some((actions, _preview)) = self.gatekeeper.redeem(token, owner) else {
            return Err(TasklaneError::ConfirmationExpired);
        };
        Ok(self.executor.execute(owner, &actions).await)
    }

    /// Parse via the model when one is attached, falling back to the rule
    /// parser on timeout, transport failure, or an invalid payload.
    async fn parse(&self, input: &str) -> CommandResponse {
        if let Some(model) = &self.model {
            match tokio::time::timeout(self.model_timeout, model.propose(SYSTEM_PROMPT, input))
                .await
            {
                Ok(Ok(payload)) => match validate_command_payload(&payload) {
                    Ok(response) => {
                        debug!(actions = response.actions.len(), "model proposal accepted");
                        return response;
                    }
                    Err(err) => {
                        warn!(error = %err, "model proposal rejected, using rule parser");
                    }
                },
                Ok(Err(err)) => {
                    warn!(error = %err, "model call failed, using rule parser");
                }
                Err(_) => {
                    warn!(timeout = ?self.model_timeout, "model call timed out, using rule parser");
                }
            }
        }
        self.parser.parse(input)
    }
}
