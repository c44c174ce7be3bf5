//! Task-state core for a fleet-based build/test scheduler.
//!
//! The scheduler dispatches work to a remote execution service and keeps
//! an authoritative local record of each task. This crate covers the
//! three state-keeping concerns:
//!
//! - reconciling untrusted status snapshots into a [`Task`] under strict
//!   idempotence and identity-consistency rules ([`Task::reconcile`]),
//! - batch serialization of tasks with all-or-nothing corruption
//!   semantics ([`codec`]),
//! - a multi-subscriber "what changed since I last looked" ledger
//!   ([`TaskLedger`]).
//!
//! Dispatch policy, retry/backoff against the execution service, and
//! durable storage live with the embedding scheduler, not here.

pub mod codec;
pub mod config;
pub mod core;
pub mod error;
pub mod ledger;
pub mod reconcile;
pub mod snapshot;

pub use config::LedgerConfig;
pub use crate::core::{sort_by_created, Task, TaskStatus};
pub use error::{Error, Result};
pub use ledger::TaskLedger;
pub use snapshot::{RemoteState, SnapshotResult, StatusSnapshot};
