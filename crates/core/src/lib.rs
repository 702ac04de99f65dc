//! # Tasklane Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - The command-understanding pipeline (rule parser, model fallback)
//! - Date/time normalization and recurrence advancement
//! - The confirmation gatekeeper and its token store
//! - The action executor
//! - Port/adapter interfaces (traits)
//!
//! ## Architecture Principles
//! - Only depends on `tasklane-domain`
//! - No database, HTTP, or platform code
//! - All external dependencies via traits
//! - Pure, testable business logic

pub mod confirm;
pub mod datetime;
pub mod executor;
pub mod matching;
pub mod parser;
pub mod pipeline;
pub mod ports;
pub mod recurrence;

// Re-export specific items to avoid ambiguity
pub use confirm::{requires_confirm, ConfirmationGatekeeper, InMemoryConfirmationStore};
pub use executor::{ActionExecutor, FixedQuotaPolicy, NoopInvalidator};
pub use parser::RuleBasedParser;
pub use pipeline::CommandService;
pub use ports::{CommandModel, ConfirmationStore, QuotaPolicy, TaskListInvalidator, TaskStore};
