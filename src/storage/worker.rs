//! Background persistence task
//!
//! Commands are applied one at a time in the order they were sent, so the
//! last ledger blob written is always the most recent one. Failures are
//! logged and counted, never retried.

use crate::error::{CacheError, Result};
use crate::storage::DurableStorage;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Work item for the persistence task
#[derive(Debug)]
pub enum PersistCommand {
    Write { key: String, value: Vec<u8> },
    /// Acknowledged once every earlier command has been applied
    Flush(oneshot::Sender<()>),
}

#[derive(Debug, Default)]
struct WorkerCounters {
    applied: AtomicU64,
    failed: AtomicU64,
}

/// Handle to the persistence task
#[derive(Debug)]
pub struct PersistenceWorker {
    sender: mpsc::UnboundedSender<PersistCommand>,
    handle: JoinHandle<()>,
    counters: Arc<WorkerCounters>,
}

impl PersistenceWorker {
    /// Spawn the task on the current tokio runtime
    pub fn spawn(storage: Arc<dyn DurableStorage>) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let counters = Arc::new(WorkerCounters::default());

        let handle = tokio::spawn(run(storage, receiver, counters.clone()));

        Self {
            sender,
            handle,
            counters,
        }
    }

    /// Queue a write; returns immediately
    pub fn enqueue_write(&self, key: impl Into<String>, value: Vec<u8>) -> Result<()> {
        self.send(PersistCommand::Write {
            key: key.into(),
            value,
        })
    }

    /// Wait until everything queued so far has been applied
    pub async fn flush(&self) -> Result<()> {
        let (ack, done) = oneshot::channel();
        self.send(PersistCommand::Flush(ack))?;
        done.await.map_err(|_| CacheError::WorkerClosed)
    }

    /// Drain the queue and stop the task
    pub async fn shutdown(self) -> Result<()> {
        let PersistenceWorker { sender, handle, .. } = self;
        drop(sender);
        handle
            .await
            .map_err(|e| CacheError::Other(format!("persistence task failed: {}", e)))
    }

    /// Commands applied successfully
    pub fn applied(&self) -> u64 {
        self.counters.applied.load(Ordering::Relaxed)
    }

    /// Commands that the storage rejected
    pub fn failed(&self) -> u64 {
        self.counters.failed.load(Ordering::Relaxed)
    }

    fn send(&self, command: PersistCommand) -> Result<()> {
        self.sender
            .send(command)
            .map_err(|_| CacheError::WorkerClosed)
    }
}

async fn run(
    storage: Arc<dyn DurableStorage>,
    mut receiver: mpsc::UnboundedReceiver<PersistCommand>,
    counters: Arc<WorkerCounters>,
) {
    debug!("Persistence worker started");

    while let Some(command) = receiver.recv().await {
        let outcome = match command {
            PersistCommand::Write { key, value } => {
                let size = value.len();
                storage
                    .set(&key, value)
                    .await
                    .map(|_| debug!("Persisted {} ({} bytes)", key, size))
            }
            PersistCommand::Flush(ack) => {
                let _ = ack.send(());
                continue;
            }
        };

        match outcome {
            Ok(()) => {
                counters.applied.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                counters.failed.fetch_add(1, Ordering::Relaxed);
                error!("Failed to persist article cache state: {}", e);
            }
        }
    }

    info!(
        "Persistence worker stopped ({} applied, {} failed)",
        counters.applied.load(Ordering::Relaxed),
        counters.failed.load(Ordering::Relaxed)
    );
}
