//! Boundary to the remote article store.
//!
//! The engine only consumes this interface; [`InMemoryRemote`] is a complete
//! in-process implementation used by tests and the command line.

mod memory;

pub use memory::{CallKind, InMemoryRemote, RemoteCall};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::{ArticleDef, ArticleId, BlockId, BlockRecord, Fields};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RemoteError {
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("Not found: {0}")]
    NotFound(String),
}

/// Body of a block creation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<BlockId>,
    pub sequence: f64,
    pub kind: String,
    #[serde(default)]
    pub data: Fields,
    #[serde(default)]
    pub extension: Fields,
}

/// Changed fields of one block. Absent fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Fields>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension: Option<Fields>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence: Option<f64>,
}

impl BlockFields {
    pub fn is_empty(&self) -> bool {
        self.kind.is_none() && self.data.is_none() && self.extension.is_none() && self.sequence.is_none()
    }
}

/// One entry of a batched block update: `{id, ...fields}` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchRequest {
    pub id: BlockId,
    #[serde(flatten)]
    pub fields: BlockFields,
}

/// Partial update of article metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArticlePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension: Option<Fields>,
}

/// Remote persistence of articles and their blocks.
///
/// Every call is fallible and may take arbitrarily long.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn get_article(&self, id: ArticleId) -> Result<ArticleDef, RemoteError>;

    /// Create one block and return it with its store-assigned id.
    async fn create_article_block(
        &self,
        article: ArticleId,
        block: NewBlock,
    ) -> Result<BlockRecord, RemoteError>;

    async fn update_blocks_batch(&self, patches: Vec<PatchRequest>) -> Result<(), RemoteError>;

    async fn delete_block(&self, id: BlockId) -> Result<(), RemoteError>;

    async fn update_article(&self, id: ArticleId, patch: ArticlePatch) -> Result<(), RemoteError>;

    async fn create_child_article(
        &self,
        parent: ArticleId,
        title: String,
    ) -> Result<ArticleDef, RemoteError>;

    /// The article with its full block tree.
    async fn export_article(&self, id: ArticleId) -> Result<ArticleDef, RemoteError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn patch_request_flattens_fields() {
        let patch = PatchRequest {
            id: BlockId::Remote(7),
            fields: BlockFields {
                sequence: Some(2.5),
                ..Default::default()
            },
        };
        assert_eq!(
            serde_json::to_value(&patch).unwrap(),
            json!({"id": 7, "sequence": 2.5})
        );
    }
}
