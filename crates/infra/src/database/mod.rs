//! SQLite-backed persistence.

mod manager;
mod task_repository;

pub use manager::DbManager;
pub use task_repository::SqliteTaskStore;
