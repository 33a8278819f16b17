use crate::model::BlockId;
use crate::remote::RemoteError;
use crate::sequence::SequenceError;
use crate::storage::StorageError;

/// Errors raised by article operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Block not found: {0}")]
    BlockNotFound(BlockId),
    #[error("Parent block not found: {0}")]
    ParentNotFound(BlockId),
    #[error(transparent)]
    Sequence(#[from] SequenceError),
    #[error("A flush is already in flight")]
    FlushInFlight,
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Remote store error: {0}")]
    Remote(#[from] RemoteError),
}
