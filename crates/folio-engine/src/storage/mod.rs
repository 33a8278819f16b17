//! Durable mirror of the pending-action buffer.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::changelog::PendingAction;

/// Key the pending buffer is stored under unless configured otherwise.
pub const DEFAULT_STORAGE_KEY: &str = "articleBlockActions";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid pending buffer: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Where the pending buffer survives restarts.
///
/// The buffer is a JSON array of pending actions kept under one fixed key.
pub trait PendingStore: Send + Sync {
    /// Load the buffer. A store that was never written yields an empty list.
    fn load(&self) -> Result<Vec<PendingAction>, StorageError>;

    /// Replace the buffer with `actions`.
    fn save(&self, actions: &[PendingAction]) -> Result<(), StorageError>;

    fn clear(&self) -> Result<(), StorageError> {
        self.save(&[])
    }
}
