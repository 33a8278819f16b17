use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a block.
///
/// Blocks loaded from the remote store carry the store's integer id. Blocks
/// created locally get a random uuid until the next flush swaps it for the id
/// the store assigned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BlockId {
    Remote(i64),
    Local(Uuid),
}

impl BlockId {
    pub fn new_local() -> Self {
        BlockId::Local(Uuid::new_v4())
    }

    pub fn is_local(&self) -> bool {
        matches!(self, BlockId::Local(_))
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockId::Remote(id) => write!(f, "{id}"),
            BlockId::Local(id) => write!(f, "local:{id}"),
        }
    }
}

impl From<i64> for BlockId {
    fn from(id: i64) -> Self {
        BlockId::Remote(id)
    }
}

/// Identifier of an article (a page owning a block tree).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArticleId(pub i64);

impl fmt::Display for ArticleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
