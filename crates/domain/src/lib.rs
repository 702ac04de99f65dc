//! # Tasklane Domain
//!
//! Business domain types and models for Tasklane.
//!
//! This crate contains:
//! - Domain data types (Action, Task, RecurrencePattern, etc.)
//! - Domain error types and Result definitions
//! - Configuration structures
//! - Action-batch validation rules
//!
//! ## Architecture
//! - No dependencies on other Tasklane crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;
pub mod validation;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
pub use validation::{validate_actions, validate_command_payload};
