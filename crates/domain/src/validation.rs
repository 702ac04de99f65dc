//! Pure structural validation for action batches.
//!
//! No I/O: these functions only inspect the payload. The executor and the
//! pipeline boundary reject any batch that has not passed through here —
//! there is no partial-trust path for model output.

use serde_json::Value;

use crate::constants::{MAX_DELETE_LIMIT, MAX_DESCRIPTION_LENGTH, MAX_TITLE_LENGTH};
use crate::errors::{Result, TasklaneError};
use crate::types::{Action, CommandResponse, TaskMatch};

/// Validate an untrusted JSON payload against the command response envelope.
///
/// The payload must be an object carrying an `actions` array and a string
/// `preview`. A missing `requiresConfirm` defaults to false rather than
/// failing. Every element of `actions` must deserialize into exactly one
/// [`Action`] variant and satisfy the field constraints.
///
/// # Errors
/// Returns `TasklaneError::Validation` naming the first violation.
pub fn validate_command_payload(payload: &Value) -> Result<CommandResponse> {
    let object = payload
        .as_object()
        .ok_or_else(|| TasklaneError::Validation("response is not a JSON object".to_string()))?;

    let raw_actions = object
        .get("actions")
        .and_then(Value::as_array)
        .ok_or_else(|| TasklaneError::Validation("response is missing an actions array".to_string()))?;

    let preview = object
        .get("preview")
        .and_then(Value::as_str)
        .ok_or_else(|| TasklaneError::Validation("response is missing a string preview".to_string()))?
        .to_string();

    let requires_confirm = match object.get("requiresConfirm") {
        None | Some(Value::Null) => false,
        Some(Value::Bool(flag)) => *flag,
        Some(other) => {
            return Err(TasklaneError::Validation(format!(
                "requiresConfirm must be a boolean, got {other}"
            )))
        }
    };

    let mut actions = Vec::with_capacity(raw_actions.len());
    for (index, raw) in raw_actions.iter().enumerate() {
        let action: Action = serde_json::from_value(raw.clone()).map_err(|err| {
            TasklaneError::Validation(format!("action {index} does not match any variant: {err}"))
        })?;
        actions.push(action);
    }

    validate_actions(&actions)?;

    Ok(CommandResponse { actions, preview, requires_confirm, confirm_token: None })
}

/// Check every action in a batch against the data-model constraints.
///
/// # Errors
/// Returns `TasklaneError::Validation` identifying the first offending
/// action and the constraint it violates.
pub fn validate_actions(actions: &[Action]) -> Result<()> {
    for (index, action) in actions.iter().enumerate() {
        validate_action(action).map_err(|err| match err {
            TasklaneError::Validation(message) => {
                TasklaneError::Validation(format!("action {index}: {message}"))
            }
            other => other,
        })?;
    }
    Ok(())
}

fn validate_action(action: &Action) -> Result<()> {
    match action {
        Action::Create { title, description, .. } => {
            validate_title(title)?;
            validate_description(description.as_deref())
        }
        Action::Update { target, patch } => {
            validate_match(target)?;
            if let Some(title) = &patch.title {
                validate_title(title)?;
            }
            validate_description(patch.description.as_deref())
        }
        Action::Delete { target, limit } => {
            validate_match(target)?;
            match limit {
                Some(0) => Err(TasklaneError::Validation("limit must be at least 1".to_string())),
                Some(limit) if *limit > MAX_DELETE_LIMIT => Err(TasklaneError::Validation(
                    format!("limit exceeds the maximum of {MAX_DELETE_LIMIT}"),
                )),
                _ => Ok(()),
            }
        }
        Action::BulkDeleteAll {} => Ok(()),
        Action::Noop { reason } => {
            if reason.trim().is_empty() {
                Err(TasklaneError::Validation("noop must carry a non-empty reason".to_string()))
            } else {
                Ok(())
            }
        }
    }
}

fn validate_title(title: &str) -> Result<()> {
    let length = title.chars().count();
    if length == 0 {
        return Err(TasklaneError::Validation("title must not be empty".to_string()));
    }
    if length > MAX_TITLE_LENGTH {
        return Err(TasklaneError::Validation(format!(
            "title exceeds the maximum of {MAX_TITLE_LENGTH} characters"
        )));
    }
    Ok(())
}

fn validate_description(description: Option<&str>) -> Result<()> {
    if let Some(description) = description {
        if description.chars().count() > MAX_DESCRIPTION_LENGTH {
            return Err(TasklaneError::Validation(format!(
                "description exceeds the maximum of {MAX_DESCRIPTION_LENGTH} characters"
            )));
        }
    }
    Ok(())
}

fn validate_match(target: &TaskMatch) -> Result<()> {
    if target.id.is_none() && target.title.as_deref().map_or(true, |t| t.trim().is_empty()) {
        return Err(TasklaneError::Validation(
            "match must carry a task id or a title".to_string(),
        ));
    }
    Ok(())
}
