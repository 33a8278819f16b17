pub mod blocks;
pub mod changelog;
pub mod error;
pub mod markdown;
pub mod model;
pub mod remote;
pub mod sequence;
pub mod storage;

// Re-export key types for easier usage
pub use blocks::{Block, BlockBehavior, BlockRegistry, MarkdownContext};
pub use changelog::{
    Action, ArticleEvent, ArticleInstance, BlockPatch, EditOutcome, EditTarget, FlushBatch,
    FlushReport, FlushTimer, PendingAction,
};
pub use error::EngineError;
pub use model::{ArticleDef, ArticleId, BlockId, BlockRecord, Fields};
pub use remote::{InMemoryRemote, RemoteError, RemoteStore};
pub use sequence::{Allocation, InsertTarget, Position, SequenceError, allocate};
pub use storage::{FileStore, MemoryStore, PendingStore, StorageError};
