//! End-to-end snapshot-driven task lifecycle.

use chrono::Duration;
use taskledger::{Task, TaskStatus};

use crate::fixtures::{now_micros, TaskIdentity};

#[test]
fn test_lifecycle_pending_to_success() {
    let now = now_micros();
    let identity = TaskIdentity::new("t1", now - Duration::hours(1));
    let mut task = Task::default();

    // First snapshot initializes every identity field.
    assert!(task.reconcile(&identity.pending()).unwrap());
    assert_eq!(task.id, "t1");
    assert_eq!(task.external_id, "ext-t1");
    assert_eq!(task.created, Some(now - Duration::hours(1)));
    assert_eq!(task.status, TaskStatus::Pending);
    assert!(task.started.is_none());

    // Reapplying the identical snapshot is a no-op.
    assert!(!task.reconcile(&identity.pending()).unwrap());

    let started = now - Duration::minutes(30);
    assert!(task.reconcile(&identity.running(started)).unwrap());
    assert_eq!(task.status, TaskStatus::Running);
    assert_eq!(task.started, Some(started));
    assert!(!task.is_finished());

    let completed = now - Duration::minutes(5);
    let snapshot = identity.completed(started, completed, false, "cafef00d");
    assert!(task.reconcile(&snapshot).unwrap());
    assert_eq!(task.status, TaskStatus::Success);
    assert_eq!(task.finished, Some(completed));
    assert_eq!(task.artifact_ref, Some("cafef00d".to_string()));
    assert!(task.is_finished());

    // Identical terminal snapshot: still no change.
    assert!(!task.reconcile(&snapshot).unwrap());
}

#[test]
fn test_lifecycle_failure_outcome() {
    let now = now_micros();
    let identity = TaskIdentity::new("t2", now - Duration::hours(1));
    let mut task = Task::default();

    let started = now - Duration::minutes(20);
    let completed = now - Duration::minutes(1);
    let snapshot = identity.completed(started, completed, true, "badc0de");
    assert!(task.reconcile(&snapshot).unwrap());
    assert_eq!(task.status, TaskStatus::Failure);
    assert_eq!(task.finished, Some(completed));
}

#[test]
fn test_snapshot_from_wrong_task_is_rejected() {
    let now = now_micros();
    let identity = TaskIdentity::new("t3", now - Duration::hours(1));
    let mut task = Task::default();
    task.reconcile(&identity.pending()).unwrap();
    let before = task.clone();

    // A snapshot belonging to a different task must be rejected in
    // full, leaving the local record untouched.
    let other = TaskIdentity::new("t4", now - Duration::hours(1));
    assert!(task.reconcile(&other.pending()).is_err());
    assert_eq!(task, before);
}

#[test]
fn test_scheduler_fields_survive_reconciliation() {
    let now = now_micros();
    let identity = TaskIdentity::new("t5", now - Duration::hours(1));
    let mut task = Task {
        commits: vec!["abc123".to_string(), "def456".to_string()],
        ..Default::default()
    };

    task.reconcile(&identity.pending()).unwrap();
    task.reconcile(&identity.running(now - Duration::minutes(10)))
        .unwrap();

    assert_eq!(
        task.commits,
        vec!["abc123".to_string(), "def456".to_string()]
    );
}
