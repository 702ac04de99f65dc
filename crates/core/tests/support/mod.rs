//! Shared test doubles for pipeline integration tests.

pub mod repositories;

pub use repositories::{InMemoryTaskStore, RecordingInvalidator, ScriptedModel};
