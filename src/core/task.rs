//! Task data model for the scheduler's authoritative state.
//!
//! A `Task` is the local record of one unit of work dispatched to the
//! remote execution fleet. Identity fields are set once (either by the
//! scheduler or by the first status snapshot) and never change; lifecycle
//! fields are rewritten on every reconciliation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Task status in its lifecycle.
///
/// Derived from the latest execution-service snapshot; not a monotonic
/// state machine, a later snapshot may report an earlier-looking state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Task created or queued but not yet picked up by a bot.
    #[default]
    Pending,
    /// Task is currently executing on a bot.
    Running,
    /// Task completed and reported success.
    Success,
    /// Task completed and reported failure.
    Failure,
    /// Task ended abnormally: bot died, canceled, expired, or timed out.
    Mishap,
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "pending"),
            TaskStatus::Running => write!(f, "running"),
            TaskStatus::Success => write!(f, "success"),
            TaskStatus::Failure => write!(f, "failure"),
            TaskStatus::Mishap => write!(f, "mishap"),
        }
    }
}

/// The local record of one task dispatched to the execution fleet.
///
/// Empty strings and `None` timestamps mean "not yet known". Identity
/// fields (`id`, `name`, `repo`, `revision`, `created`, `external_id`),
/// once non-empty, are never overwritten with a different value; a
/// snapshot that disagrees is rejected in full.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Task {
    /// Unique identifier for this task, assigned by the scheduler.
    pub id: String,
    /// Human-readable name for the task.
    pub name: String,
    /// Repository the task builds or tests.
    pub repo: String,
    /// Source revision the task runs at.
    pub revision: String,
    /// When the task was created on the execution service.
    pub created: Option<DateTime<Utc>>,
    /// The execution service's identifier for this task.
    pub external_id: String,
    /// When the task started executing.
    pub started: Option<DateTime<Utc>>,
    /// When the task finished, completed or abandoned.
    pub finished: Option<DateTime<Utc>>,
    /// Current lifecycle status.
    pub status: TaskStatus,
    /// Content-addressed reference to the task's produced output.
    pub artifact_ref: Option<String>,
    /// Source-control revisions covered by this task. Set by the
    /// scheduler, never touched by reconciliation.
    pub commits: Vec<String>,
}

impl Task {
    /// Check if the task is in a terminal state.
    pub fn is_finished(&self) -> bool {
        matches!(
            self.status,
            TaskStatus::Success | TaskStatus::Failure | TaskStatus::Mishap
        )
    }
}

/// Sort tasks by creation time ascending, unset first.
///
/// Ties are broken by `id` so the ordering is deterministic for tasks
/// sharing a creation timestamp.
pub fn sort_by_created(tasks: &mut [Task]) {
    tasks.sort_by(|a, b| a.created.cmp(&b.created).then_with(|| a.id.cmp(&b.id)));
}
