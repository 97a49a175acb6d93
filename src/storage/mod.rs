//! Durable key-value storage
//!
//! The cache mirrors its recently-viewed ledger (and optionally each
//! article) into a byte store that outlives the process. Writes go through
//! [`PersistenceWorker`] so callers never wait on them.

pub mod file;
pub mod memory;
pub mod worker;

pub use file::FileStorage;
pub use memory::MemoryStorage;
pub use worker::{PersistCommand, PersistenceWorker};

use crate::error::Result;
use async_trait::async_trait;

/// Async byte store keyed by string
#[async_trait]
pub trait DurableStorage: Send + Sync + 'static {
    /// Read a value; `Ok(None)` when the key was never written
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Write a value, replacing any previous one
    async fn set(&self, key: &str, value: Vec<u8>) -> Result<()>;

    /// Delete a value; returns whether it existed
    async fn remove(&self, key: &str) -> Result<bool>;
}
