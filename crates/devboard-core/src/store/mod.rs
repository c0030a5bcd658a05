use async_trait::async_trait;
use thiserror::Error;

use crate::tasks::{LoadError, Task};

mod memory;

pub use memory::InMemoryTaskStore;

/// Errors produced by task store implementations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Persisted data exists but cannot be trusted.
    #[error(transparent)]
    Load(#[from] LoadError),
    /// Underlying storage failure (I/O, permissions, encoding).
    #[error("storage failure: {reason}")]
    Storage { reason: String },
}

/// Whole-collection persistence. There is no locking: two overlapping
/// load/save cycles race and the later `save` wins.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Load and normalize every task. Missing storage is an empty collection.
    async fn load(&self) -> Result<Vec<Task>, StoreError>;

    /// Overwrite the persisted collection with `tasks`.
    async fn save(&self, tasks: &[Task]) -> Result<(), StoreError>;
}

pub fn storage_err<E: ToString>(err: E) -> StoreError {
    StoreError::Storage {
        reason: err.to_string(),
    }
}
