//! Batch serialization of tasks to and from opaque binary blobs.
//!
//! The encoder buffers tasks and yields `(task, blob)` pairs lazily so a
//! caller can stream blobs to storage without materializing the whole
//! encoded batch. The decoder buffers blobs and decodes them all at
//! once with all-or-nothing semantics: one corrupt blob fails the whole
//! batch, partial results are never returned.

use std::collections::VecDeque;

use crate::core::task::Task;
use crate::error::{Error, Result};

/// Serialize a single task into its wire blob.
pub fn encode_task(task: &Task) -> Result<Vec<u8>> {
    bincode::serialize(task).map_err(Error::Encode)
}

/// Streaming encoder for a batch of tasks.
///
/// Feed tasks with [`process`](TaskEncoder::process), then pull
/// `(task, blob)` pairs in intake order via the `Iterator` impl.
#[derive(Debug, Default)]
pub struct TaskEncoder {
    pending: VecDeque<Task>,
}

impl TaskEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept a task for encoding. Never rejects a well-formed task;
    /// serialization happens lazily when the pair is pulled.
    pub fn process(&mut self, task: Task) -> bool {
        self.pending.push_back(task);
        true
    }
}

impl Iterator for TaskEncoder {
    type Item = Result<(Task, Vec<u8>)>;

    fn next(&mut self) -> Option<Self::Item> {
        let task = self.pending.pop_front()?;
        Some(encode_task(&task).map(|blob| (task, blob)))
    }
}

/// Batch decoder with all-or-nothing corruption semantics.
#[derive(Debug, Default)]
pub struct TaskDecoder {
    decoded: Vec<Task>,
    failed: Option<Error>,
}

impl TaskDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept one serialized blob.
    ///
    /// The return value is a best-effort hint: `true` until a malformed
    /// blob has been observed. It is not authoritative; callers must
    /// still check [`result`](TaskDecoder::result).
    pub fn process(&mut self, blob: &[u8]) -> bool {
        if self.failed.is_some() {
            return false;
        }
        match bincode::deserialize(blob) {
            Ok(task) => {
                self.decoded.push(task);
                true
            }
            Err(e) => {
                self.failed = Some(Error::Decode(e));
                false
            }
        }
    }

    /// Decode the accumulated batch.
    ///
    /// All-or-nothing: if any blob failed to decode, every
    /// successfully-decoded task is discarded and the error is returned.
    /// Order of the returned tasks is unspecified.
    pub fn result(self) -> Result<Vec<Task>> {
        match self.failed {
            Some(err) => Err(err),
            None => Ok(self.decoded),
        }
    }
}
