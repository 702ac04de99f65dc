//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for Tasklane
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum TasklaneError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Multiple tasks match '{query}': {}. Use a more specific title or the task id.", candidates.join(", "))]
    Ambiguity { query: String, candidates: Vec<String> },

    #[error("Task limit reached ({current}/{limit}). Delete or complete tasks before adding more.")]
    Quota { limit: usize, current: usize },

    #[error("Confirmation expired, please retry")]
    ConfirmationExpired,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for Tasklane operations
pub type Result<T> = std::result::Result<T, TasklaneError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ambiguity_message_lists_candidates() {
        let err = TasklaneError::Ambiguity {
            query: "gym".to_string(),
            candidates: vec!["gym".to_string(), "gym class".to_string()],
        };
        let message = err.to_string();
        assert!(message.contains("gym class"));
        assert!(message.contains("more specific"));
    }

    #[test]
    fn confirmation_error_does_not_leak_cause() {
        let err = TasklaneError::ConfirmationExpired;
        assert_eq!(err.to_string(), "Confirmation expired, please retry");
    }

    #[test]
    fn serializes_with_type_tag() {
        let err = TasklaneError::Database("disk full".to_string());
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["type"], "Database");
        assert_eq!(json["message"], "disk full");
    }
}
