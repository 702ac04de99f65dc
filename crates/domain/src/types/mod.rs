//! Domain data types

pub mod action;
pub mod recurrence;
pub mod task;

pub use action::{
    Action, CommandOutcome, CommandResponse, ExecutionOutcome, PendingConfirmation, TaskMatch,
    TaskPatch, TaskStatus,
};
pub use recurrence::{Frequency, RecurrencePattern};
pub use task::{NewTask, Task};
