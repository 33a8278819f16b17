//! Change log of an opened article.
//!
//! Edits are applied to the live tree immediately and queued as [`Action`]s.
//! The queue is mirrored to a durable store after every change and flushed
//! to the remote store in batches.

mod action;
mod article;
mod flush;
mod reconcile;
mod timer;
mod tree;

pub use action::{Action, BlockPatch, PendingAction, coalesce};
pub use article::ArticleEvent;
pub use article::ArticleInstance;
pub use flush::{FlushBatch, FlushOutcome, FlushReport};
pub use reconcile::{EditOutcome, EditTarget};
pub use timer::{DEFAULT_FLUSH_DELAY, FlushTimer};
pub use tree::ArticleTree;
