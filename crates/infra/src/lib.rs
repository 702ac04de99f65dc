//! # Tasklane Infrastructure
//!
//! Infrastructure implementations of core ports.
//!
//! This crate contains:
//! - The SQLite task store and its connection pool
//! - The retrying HTTP client
//! - The OpenAI-backed command model
//! - The configuration loader
//!
//! ## Architecture
//! - Implements traits defined in `tasklane-core`
//! - Depends on `tasklane-domain` and `tasklane-core`
//! - Contains all "impure" code (I/O, network)

pub mod config;
pub mod database;
pub mod errors;
pub mod http;
pub mod integrations;

// Re-export commonly used items
pub use database::{DbManager, SqliteTaskStore};
pub use errors::InfraError;
pub use http::HttpClient;
pub use integrations::openai::OpenAiCommandModel;
