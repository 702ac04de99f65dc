//! OpenAI integration for natural-language command parsing.
//!
//! Provides the [`tasklane_core::ports::CommandModel`] implementation that
//! asks the Chat Completions API to translate user text into a command
//! response JSON object.
//!
//! # Architecture
//!
//! - **Client**: [`OpenAiCommandModel`] wraps the retrying [`crate::http::HttpClient`]
//! - **Types**: request/response types for the Chat Completions API
//! - **Error Handling**: structured [`OpenAiError`] mapped into the domain error
//!
//! The model is untrusted: its output is returned as raw JSON for the
//! pipeline to validate; nothing here acts on the content.
//!
//! # Error Handling
//!
//! - Network errors are retried by `HttpClient`
//! - Server errors (5xx) are retried with exponential backoff
//! - Client errors (4xx) are not retried
//! - Any failure sends the pipeline back to the rule-based parser

pub mod client;
pub mod types;

pub use client::OpenAiCommandModel;
pub use types::OpenAiError;
