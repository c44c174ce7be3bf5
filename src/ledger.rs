//! Per-subscriber change tracking for modified tasks.
//!
//! The `TaskLedger` lets any number of independent consumers discover
//! which tasks changed since their last poll, without holding full
//! snapshots. Each subscriber gets an opaque token and its own queue of
//! serialized task blobs; polling drains the queue. Subscribers that
//! stop polling are reclaimed by a background sweep after a TTL, which
//! is the only form of automatic resource reclamation here. Queues are
//! otherwise unbounded between polls; the TTL bounds their lifetime.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;

use crate::codec::{encode_task, TaskDecoder};
use crate::config::LedgerConfig;
use crate::core::task::{sort_by_created, Task};
use crate::error::{Error, Result};

#[derive(Debug, Default)]
struct LedgerInner {
    /// Subscriber token -> serialized task blobs awaiting delivery.
    pending: HashMap<String, Vec<Vec<u8>>>,
    /// Subscriber token -> when it is dropped unless it polls again.
    expirations: HashMap<String, Instant>,
    /// Cancellation handle for the running sweep task, if any.
    sweeper: Option<CancellationToken>,
}

/// Multi-subscriber ledger of modified tasks.
///
/// The ledger exclusively owns the subscriber map and every pending
/// queue; callers hold only opaque tokens and receive decoded task
/// copies. A single lock guards the whole structure: every operation
/// mutates shared state (`get_modified` drains its queue and refreshes
/// its expiry), so none qualifies as a pure reader.
pub struct TaskLedger {
    inner: Arc<RwLock<LedgerInner>>,
    config: LedgerConfig,
}

impl TaskLedger {
    /// Create an empty ledger. No background work runs until the first
    /// subscriber registers.
    pub fn new(config: LedgerConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(LedgerInner::default())),
            config,
        }
    }

    /// Register a new subscriber and return its opaque token.
    ///
    /// Starts the background sweep task when going from zero
    /// subscribers; the sweep exits on its own once all subscribers
    /// expire and is restarted lazily by a later registration.
    ///
    /// # Errors
    /// Returns `TooManySubscribers` when the configured cap is reached.
    pub async fn start_tracking(&self) -> Result<String> {
        let mut inner = self.inner.write().await;
        if inner.expirations.len() >= self.config.max_subscribers {
            return Err(Error::TooManySubscribers {
                max: self.config.max_subscribers,
            });
        }

        let token = Uuid::new_v4().to_string();
        inner.pending.insert(token.clone(), Vec::new());
        inner
            .expirations
            .insert(token.clone(), Instant::now() + self.config.ttl);

        if inner.sweeper.is_none() {
            let cancel = CancellationToken::new();
            inner.sweeper = Some(cancel.clone());
            tokio::spawn(sweep_expired(
                Arc::clone(&self.inner),
                self.config.sweep_interval,
                cancel,
            ));
        }

        debug!(token = %token, "subscriber registered");
        Ok(token)
    }

    /// Record a modified task for delivery to every active subscriber.
    ///
    /// # Errors
    /// Encoding a well-formed task never fails; an `Encode` error here
    /// is a programming-invariant violation the embedding process may
    /// treat as fatal.
    pub async fn track(&self, task: &Task) -> Result<()> {
        let blob = encode_task(task)?;
        self.track_serialized(vec![blob]).await;
        Ok(())
    }

    /// Batch variant of [`track`](TaskLedger::track) for blobs that are
    /// already serialized.
    pub async fn track_serialized(&self, blobs: Vec<Vec<u8>>) {
        let mut inner = self.inner.write().await;
        for queue in inner.pending.values_mut() {
            queue.extend(blobs.iter().cloned());
        }
    }

    /// Drain and decode the subscriber's pending queue.
    ///
    /// Returns every task tracked since the subscriber's last poll,
    /// sorted by creation time ascending, and refreshes its expiry. An
    /// empty result is normal when nothing changed.
    ///
    /// # Errors
    /// `UnknownSubscriber` if the token was never registered or has
    /// expired. A decode failure propagates as-is and leaves the queue
    /// intact, so corrupted tracked data stays observable rather than
    /// being silently dropped.
    pub async fn get_modified(&self, token: &str) -> Result<Vec<Task>> {
        let mut inner = self.inner.write().await;
        if !inner.expirations.contains_key(token) {
            return Err(Error::UnknownSubscriber(token.to_string()));
        }

        let mut decoder = TaskDecoder::new();
        if let Some(queue) = inner.pending.get(token) {
            for blob in queue {
                if !decoder.process(blob) {
                    break;
                }
            }
        }
        let mut tasks = decoder.result()?;

        if let Some(queue) = inner.pending.get_mut(token) {
            queue.clear();
        }
        inner
            .expirations
            .insert(token.to_string(), Instant::now() + self.config.ttl);

        sort_by_created(&mut tasks);
        Ok(tasks)
    }

    /// Number of currently registered subscribers.
    pub async fn subscriber_count(&self) -> usize {
        self.inner.read().await.expirations.len()
    }

    /// Stop the background sweep and drop all subscribers.
    pub async fn shutdown(&self) {
        let mut inner = self.inner.write().await;
        if let Some(cancel) = inner.sweeper.take() {
            cancel.cancel();
        }
        inner.pending.clear();
        inner.expirations.clear();
    }
}

/// Background sweep: drops subscribers whose expiry has passed.
///
/// Exits once no subscribers remain, clearing its own handle so the
/// next registration restarts it.
async fn sweep_expired(
    inner: Arc<RwLock<LedgerInner>>,
    interval: std::time::Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    // The first tick of a tokio interval completes immediately.
    ticker.tick().await;
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                let mut guard = inner.write().await;
                // A shutdown may have raced this tick; a cancelled sweep
                // must not touch state that now belongs to a successor.
                if cancel.is_cancelled() {
                    break;
                }
                let now = Instant::now();
                let expired: Vec<String> = guard
                    .expirations
                    .iter()
                    .filter(|(_, expires)| **expires <= now)
                    .map(|(token, _)| token.clone())
                    .collect();
                for token in expired {
                    guard.pending.remove(&token);
                    guard.expirations.remove(&token);
                    debug!(token = %token, "expired subscriber dropped");
                }
                if guard.expirations.is_empty() {
                    guard.pending.clear();
                    guard.sweeper = None;
                    break;
                }
            }
        }
    }
}
