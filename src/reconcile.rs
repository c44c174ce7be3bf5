//! Reconciliation of execution-service snapshots into local task state.
//!
//! The execution service reports untrusted, possibly-partial snapshots.
//! Reconciliation validates a snapshot in full before touching the task:
//! the result block must be present, identity tags must form a strict
//! closed set, every present timestamp must parse, and every identity
//! field the task already carries must match the snapshot exactly. Only
//! then are lifecycle fields recomputed from the snapshot.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::core::task::{Task, TaskStatus};
use crate::error::{Error, Result};
use crate::snapshot::{parse_timestamp, IdentityTags, RemoteState, StatusSnapshot};

/// Map the service's `(state, failure)` pair onto a task status.
fn map_status(state: RemoteState, failure: bool) -> TaskStatus {
    match (state, failure) {
        (RemoteState::Pending, _) => TaskStatus::Pending,
        (RemoteState::Running, _) => TaskStatus::Running,
        (RemoteState::Completed, false) => TaskStatus::Success,
        (RemoteState::Completed, true) => TaskStatus::Failure,
        (
            RemoteState::BotDied
            | RemoteState::Canceled
            | RemoteState::Expired
            | RemoteState::TimedOut,
            _,
        ) => TaskStatus::Mishap,
    }
}

/// Reject a snapshot value that disagrees with an already-set field.
fn check_identity(field: &'static str, current: &str, snapshot: &str) -> Result<()> {
    if !current.is_empty() && current != snapshot {
        return Err(Error::IdentityMismatch { field });
    }
    Ok(())
}

/// Timestamps compare at the service's microsecond precision.
fn same_instant(a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
    a.timestamp_micros() == b.timestamp_micros()
}

impl Task {
    /// Merge a status snapshot into this task.
    ///
    /// Returns whether any tracked field actually changed. Reapplying the
    /// same snapshot is idempotent: the second call returns `Ok(false)`.
    ///
    /// # Errors
    ///
    /// `MissingResult`, `InvalidTag`, `TimestampParse`, or
    /// `IdentityMismatch`. On any error the task is left untouched.
    pub fn reconcile(&mut self, snapshot: &StatusSnapshot) -> Result<bool> {
        let result = snapshot.result.as_ref().ok_or(Error::MissingResult)?;
        let tags = IdentityTags::parse(&result.tags)?;

        let created = match &result.created_ts {
            Some(v) => Some(parse_timestamp("created", v)?),
            None => None,
        };
        let started = match &result.started_ts {
            Some(v) => Some(parse_timestamp("started", v)?),
            None => None,
        };
        let completed = match &result.completed_ts {
            Some(v) => Some(parse_timestamp("completed", v)?),
            None => None,
        };
        let abandoned = match &result.abandoned_ts {
            Some(v) => Some(parse_timestamp("abandoned", v)?),
            None => None,
        };

        check_identity("id", &self.id, &tags.id)?;
        check_identity("name", &self.name, &tags.name)?;
        check_identity("repo", &self.repo, &tags.repo)?;
        check_identity("revision", &self.revision, &tags.revision)?;
        if let (Some(current), Some(new)) = (self.created, created) {
            if !same_instant(current, new) {
                return Err(Error::IdentityMismatch { field: "created" });
            }
        }
        check_identity("external_id", &self.external_id, &snapshot.external_id)?;

        // Validation passed; compute every tracked field before mutating
        // anything so an unchanged verdict implies an untouched task.
        let new_id = if self.id.is_empty() {
            tags.id
        } else {
            self.id.clone()
        };
        let new_name = if self.name.is_empty() {
            tags.name
        } else {
            self.name.clone()
        };
        let new_repo = if self.repo.is_empty() {
            tags.repo
        } else {
            self.repo.clone()
        };
        let new_revision = if self.revision.is_empty() {
            tags.revision
        } else {
            self.revision.clone()
        };
        let new_created = self.created.or(created);
        let new_external_id = if self.external_id.is_empty() {
            snapshot.external_id.clone()
        } else {
            self.external_id.clone()
        };
        let new_status = map_status(result.state, result.failure);
        let new_started = started;
        // Completion time wins over abandonment time when both are set.
        let new_finished = completed.or(abandoned);
        let new_artifact_ref = result.output_ref.clone().or_else(|| self.artifact_ref.clone());

        let changed = new_id != self.id
            || new_name != self.name
            || new_repo != self.repo
            || new_revision != self.revision
            || new_created != self.created
            || new_external_id != self.external_id
            || new_started != self.started
            || new_finished != self.finished
            || new_status != self.status
            || new_artifact_ref != self.artifact_ref;

        if changed {
            self.id = new_id;
            self.name = new_name;
            self.repo = new_repo;
            self.revision = new_revision;
            self.created = new_created;
            self.external_id = new_external_id;
            self.started = new_started;
            self.finished = new_finished;
            self.status = new_status;
            self.artifact_ref = new_artifact_ref;
            debug!(id = %self.id, status = %self.status, "task updated from snapshot");
        }

        Ok(changed)
    }
}
