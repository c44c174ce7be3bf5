//! Core domain types: the task entity and its ordering helpers.

pub mod task;

pub use task::{sort_by_created, Task, TaskStatus};
