//! Status snapshots reported by the remote execution service.
//!
//! A snapshot is one point-in-time report about a single task: a wrapper
//! carrying the service's task id, and a result block with timestamps,
//! the service's state value, a failure flag, identity tags, and an
//! optional output reference. Snapshots are untrusted input; everything
//! here is validated before a `Task` is touched.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Textual timestamp format used by the execution service,
/// e.g. `2016-08-17T14:23:02.543490`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Tag key carrying the scheduler-assigned task id.
pub const TAG_ID: &str = "id";
/// Tag key carrying the task name.
pub const TAG_NAME: &str = "name";
/// Tag key carrying the repository URL.
pub const TAG_REPO: &str = "repo";
/// Tag key carrying the source revision.
pub const TAG_REVISION: &str = "revision";

/// Task state vocabulary of the execution service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RemoteState {
    /// Queued, waiting for a bot.
    Pending,
    /// Executing on a bot.
    Running,
    /// Ran to completion; see the failure flag for the outcome.
    Completed,
    /// The bot executing the task died.
    BotDied,
    /// Canceled before completion.
    Canceled,
    /// Expired before a bot picked it up.
    Expired,
    /// Killed after exceeding its execution timeout.
    TimedOut,
}

/// One status report from the execution service about a single task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    /// The execution service's identifier for the task.
    pub external_id: String,
    /// The result block; absent in degenerate service responses.
    pub result: Option<SnapshotResult>,
}

/// The result block of a status snapshot.
///
/// Timestamps are in [`TIMESTAMP_FORMAT`]; `None` means the event has
/// not happened yet (or the service omitted it).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotResult {
    /// When the service created the task.
    pub created_ts: Option<String>,
    /// When a bot started executing the task.
    pub started_ts: Option<String>,
    /// When the task ran to completion.
    pub completed_ts: Option<String>,
    /// When the service gave up on the task.
    pub abandoned_ts: Option<String>,
    /// When the service last touched its own record. Informational;
    /// reconciliation never reads it.
    pub modified_ts: Option<String>,
    /// The service's state value.
    pub state: RemoteState,
    /// Whether a completed task reported failure.
    pub failure: bool,
    /// Identity tags as `key:value` strings.
    pub tags: Vec<String>,
    /// Content-addressed reference to the task's output, if any.
    pub output_ref: Option<String>,
}

/// Identity fields extracted from a snapshot's tag set.
///
/// The tag set is a strict closed mapping: exactly the four recognized
/// keys, each exactly once. Anything else is rejected.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentityTags {
    pub id: String,
    pub name: String,
    pub repo: String,
    pub revision: String,
}

impl IdentityTags {
    /// Parse a snapshot's tag list into its identity fields.
    ///
    /// # Errors
    /// Returns `InvalidTag` for malformed tags, unrecognized keys,
    /// duplicate keys, and missing required keys.
    pub fn parse(tags: &[String]) -> Result<Self> {
        let mut id = None;
        let mut name = None;
        let mut repo = None;
        let mut revision = None;

        for tag in tags {
            let (key, value) = tag
                .split_once(':')
                .ok_or_else(|| Error::InvalidTag(tag.clone()))?;
            let slot = match key {
                TAG_ID => &mut id,
                TAG_NAME => &mut name,
                TAG_REPO => &mut repo,
                TAG_REVISION => &mut revision,
                _ => return Err(Error::InvalidTag(tag.clone())),
            };
            if slot.is_some() {
                return Err(Error::InvalidTag(format!("duplicate key: {}", key)));
            }
            *slot = Some(value.to_string());
        }

        match (id, name, repo, revision) {
            (Some(id), Some(name), Some(repo), Some(revision)) => Ok(Self {
                id,
                name,
                repo,
                revision,
            }),
            _ => Err(Error::InvalidTag("missing required key".to_string())),
        }
    }
}

/// Parse a service timestamp, tagging errors with the field name.
pub fn parse_timestamp(field: &'static str, value: &str) -> Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|_| Error::TimestampParse {
            field,
            value: value.to_string(),
        })
}

/// Format a timestamp the way the execution service reports them.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}
