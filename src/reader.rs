//! External input sources with an explicit lifecycle.
//!
//! A reader moves `Uninitialized -> Running -> Stopped`. `start` and
//! `shutdown` are idempotent; `read_next` is only legal while running.

use std::sync::mpsc::{sync_channel, Receiver, SyncSender};

use crate::error::{OpError, Result};
use crate::tensor::TensorValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderState {
    Uninitialized,
    Running,
    Stopped,
}

/// A source of tensor batches. Implementations supply the transitions; the
/// state machine lives in [`ManagedReader`].
pub trait ReaderImpl: Send {
    /// Prepare for reading; called on every transition into `Running`.
    fn start(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Release resources; called on the transition into `Stopped`.
    fn shutdown(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Produce the next batch, or `None` when the source is exhausted.
    fn read_next(&mut self) -> anyhow::Result<Option<Vec<TensorValue>>>;
}

/// State machine wrapper around a reader implementation.
pub struct ManagedReader {
    state: ReaderState,
    inner: Box<dyn ReaderImpl>,
}

impl ManagedReader {
    pub fn new(inner: Box<dyn ReaderImpl>) -> Self {
        ManagedReader {
            state: ReaderState::Uninitialized,
            inner,
        }
    }

    pub fn state(&self) -> ReaderState {
        self.state
    }

    /// Transition into `Running`. A reader that is already running stays
    /// running.
    pub fn start(&mut self) -> Result<()> {
        if self.state == ReaderState::Running {
            return Ok(());
        }
        self.inner
            .start()
            .map_err(|err| OpError::precondition(format!("reader start failed: {}", err)))?;
        self.state = ReaderState::Running;
        Ok(())
    }

    /// Transition into `Stopped`. Idempotent.
    pub fn shutdown(&mut self) -> Result<()> {
        if self.state == ReaderState::Stopped {
            return Ok(());
        }
        self.inner
            .shutdown()
            .map_err(|err| OpError::precondition(format!("reader shutdown failed: {}", err)))?;
        self.state = ReaderState::Stopped;
        Ok(())
    }

    /// Read one batch; only legal while running.
    pub fn read_next(&mut self) -> Result<Option<Vec<TensorValue>>> {
        if self.state != ReaderState::Running {
            return Err(OpError::ReaderNotRunning);
        }
        self.inner
            .read_next()
            .map_err(|err| OpError::precondition(format!("reader failed: {}", err)))
    }
}

/// Replayable in-memory source: `start` rewinds to the first batch.
pub struct BatchReader {
    batches: Vec<Vec<TensorValue>>,
    cursor: usize,
}

impl BatchReader {
    pub fn new(batches: Vec<Vec<TensorValue>>) -> Self {
        BatchReader { batches, cursor: 0 }
    }
}

impl ReaderImpl for BatchReader {
    fn start(&mut self) -> anyhow::Result<()> {
        self.cursor = 0;
        Ok(())
    }

    fn read_next(&mut self) -> anyhow::Result<Option<Vec<TensorValue>>> {
        if self.cursor >= self.batches.len() {
            return Ok(None);
        }
        let batch = self.batches[self.cursor].clone();
        self.cursor += 1;
        Ok(Some(batch))
    }
}

/// Blocking queue-backed source. `read_next` blocks until a producer sends
/// a batch or the channel disconnects.
pub struct QueueReader {
    rx: Receiver<Vec<TensorValue>>,
}

impl ReaderImpl for QueueReader {
    fn read_next(&mut self) -> anyhow::Result<Option<Vec<TensorValue>>> {
        Ok(self.rx.recv().ok())
    }
}

/// Build a bounded queue reader and its producer handle.
pub fn channel_reader(capacity: usize) -> (SyncSender<Vec<TensorValue>>, QueueReader) {
    let (tx, rx) = sync_channel(capacity);
    (tx, QueueReader { rx })
}
