//! Application constants
//!
//! Centralized location for all domain-level constants used throughout the
//! application.

// Action field limits
pub const MAX_TITLE_LENGTH: usize = 120;
pub const MAX_DESCRIPTION_LENGTH: usize = 500;
pub const MAX_DELETE_LIMIT: u32 = 100;

// A delete-by-title shorter than this is treated as too vague to run
// without confirmation.
pub const MIN_UNAMBIGUOUS_TITLE_LENGTH: usize = 5;

// Ambiguous-match errors name at most this many candidate titles.
pub const AMBIGUITY_CANDIDATE_LIMIT: usize = 5;

// Confirmation tokens
pub const CONFIRMATION_TTL_SECS: u64 = 600;
pub const CONFIRMATION_SWEEP_INTERVAL_SECS: u64 = 60;

// Quota
pub const DEFAULT_TASK_QUOTA: usize = 200;

// Recurrence
pub const DEFAULT_RECURRENCE_TIMEZONE: &str = "UTC";

// Language model
pub const DEFAULT_MODEL_TIMEOUT_SECS: u64 = 15;
