use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use super::{ArticlePatch, NewBlock, PatchRequest, RemoteError, RemoteStore};
use crate::model::{ArticleDef, ArticleId, BlockId, BlockRecord};

/// Which remote call a [`RemoteCall`] was, used to arrange failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
    GetArticle,
    CreateBlock,
    UpdateBlocksBatch,
    DeleteBlock,
    UpdateArticle,
    CreateChildArticle,
    ExportArticle,
}

/// A call received by [`InMemoryRemote`], with its arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteCall {
    GetArticle(ArticleId),
    CreateBlock(ArticleId, NewBlock),
    UpdateBlocksBatch(Vec<PatchRequest>),
    DeleteBlock(BlockId),
    UpdateArticle(ArticleId, ArticlePatch),
    CreateChildArticle(ArticleId, String),
    ExportArticle(ArticleId),
}

impl RemoteCall {
    pub fn kind(&self) -> CallKind {
        match self {
            RemoteCall::GetArticle(_) => CallKind::GetArticle,
            RemoteCall::CreateBlock(..) => CallKind::CreateBlock,
            RemoteCall::UpdateBlocksBatch(_) => CallKind::UpdateBlocksBatch,
            RemoteCall::DeleteBlock(_) => CallKind::DeleteBlock,
            RemoteCall::UpdateArticle(..) => CallKind::UpdateArticle,
            RemoteCall::CreateChildArticle(..) => CallKind::CreateChildArticle,
            RemoteCall::ExportArticle(_) => CallKind::ExportArticle,
        }
    }
}

#[derive(Debug, Default)]
struct State {
    articles: HashMap<ArticleId, ArticleDef>,
    /// Blocks by id, stored without children; the tree is rebuilt on read.
    blocks: HashMap<i64, (ArticleId, BlockRecord)>,
    next_block_id: i64,
    next_article_id: i64,
    calls: Vec<RemoteCall>,
    failing: HashSet<CallKind>,
}

/// Remote store kept in memory.
///
/// Records every call it receives and can be told to reject calls of a given
/// kind, which is how flush failures are exercised.
#[derive(Debug, Default)]
pub struct InMemoryRemote {
    state: Mutex<State>,
}

impl InMemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with `article` and its block tree, keeping the ids of
    /// blocks that already have remote ids.
    pub fn with_article(self, article: ArticleDef) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.insert_article(article);
        }
        self
    }

    /// Reject every following call of `kind`.
    pub fn fail_on(&self, kind: CallKind) {
        if let Ok(mut state) = self.state.lock() {
            state.failing.insert(kind);
        }
    }

    /// Stop rejecting calls.
    pub fn recover(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.failing.clear();
        }
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        self.state
            .lock()
            .map(|state| state.calls.clone())
            .unwrap_or_default()
    }

    pub fn calls_of(&self, kind: CallKind) -> Vec<RemoteCall> {
        self.calls()
            .into_iter()
            .filter(|call| call.kind() == kind)
            .collect()
    }

    pub fn clear_calls(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.calls.clear();
        }
    }

    /// Lock the state and log `call`, failing if its kind is set to fail.
    fn begin(&self, call: RemoteCall) -> Result<MutexGuard<'_, State>, RemoteError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| RemoteError::Transport("remote state poisoned".to_string()))?;
        let kind = call.kind();
        state.calls.push(call);
        if state.failing.contains(&kind) {
            return Err(RemoteError::Transport(format!("{kind:?} unavailable")));
        }
        Ok(state)
    }
}

impl State {
    fn insert_article(&mut self, mut article: ArticleDef) {
        let blocks = std::mem::take(&mut article.blocks);
        self.next_article_id = self.next_article_id.max(article.id.0);
        for record in blocks {
            self.insert_tree(article.id, None, record);
        }
        self.articles.insert(article.id, article);
    }

    fn insert_tree(&mut self, article: ArticleId, parent: Option<BlockId>, mut record: BlockRecord) {
        let children = std::mem::take(&mut record.children);
        let id = match record.id {
            Some(BlockId::Remote(id)) => {
                self.next_block_id = self.next_block_id.max(id);
                id
            }
            _ => self.allocate_block_id(),
        };
        record.id = Some(BlockId::Remote(id));
        record.page_id = Some(article);
        record.parent_id = parent;
        self.blocks.insert(id, (article, record));
        for child in children {
            self.insert_tree(article, Some(BlockId::Remote(id)), child);
        }
    }

    fn allocate_block_id(&mut self) -> i64 {
        self.next_block_id += 1;
        self.next_block_id
    }

    fn remote_id(id: &BlockId) -> Result<i64, RemoteError> {
        match id {
            BlockId::Remote(id) => Ok(*id),
            BlockId::Local(_) => Err(RemoteError::NotFound(format!("block {id}"))),
        }
    }

    fn export(&self, id: ArticleId) -> Result<ArticleDef, RemoteError> {
        let mut article = self
            .articles
            .get(&id)
            .cloned()
            .ok_or_else(|| RemoteError::NotFound(format!("article {id}")))?;
        article.blocks = self.children_of(id, None);
        Ok(article)
    }

    fn children_of(&self, article: ArticleId, parent: Option<&BlockId>) -> Vec<BlockRecord> {
        let mut children: Vec<BlockRecord> = self
            .blocks
            .values()
            .filter(|(owner, record)| *owner == article && record.parent_id.as_ref() == parent)
            .map(|(_, record)| record.clone())
            .collect();
        children.sort_by(|a, b| a.sequence.total_cmp(&b.sequence));
        for child in &mut children {
            child.children = self.children_of(article, child.id.as_ref());
        }
        children
    }

    fn remove_subtree(&mut self, id: i64) {
        let parent = Some(BlockId::Remote(id));
        let children: Vec<i64> = self
            .blocks
            .iter()
            .filter(|(_, (_, record))| record.parent_id == parent)
            .map(|(child, _)| *child)
            .collect();
        for child in children {
            self.remove_subtree(child);
        }
        self.blocks.remove(&id);
    }
}

#[async_trait]
impl RemoteStore for InMemoryRemote {
    async fn get_article(&self, id: ArticleId) -> Result<ArticleDef, RemoteError> {
        let state = self.begin(RemoteCall::GetArticle(id))?;
        state.export(id)
    }

    async fn create_article_block(
        &self,
        article: ArticleId,
        block: NewBlock,
    ) -> Result<BlockRecord, RemoteError> {
        let mut state = self.begin(RemoteCall::CreateBlock(article, block.clone()))?;
        if !state.articles.contains_key(&article) {
            return Err(RemoteError::NotFound(format!("article {article}")));
        }
        if let Some(parent) = &block.parent_id {
            let parent = State::remote_id(parent)?;
            if !state.blocks.contains_key(&parent) {
                return Err(RemoteError::NotFound(format!("parent block {parent}")));
            }
        }
        let id = state.allocate_block_id();
        let record = BlockRecord {
            id: Some(BlockId::Remote(id)),
            page_id: Some(article),
            parent_id: block.parent_id,
            sequence: block.sequence,
            kind: block.kind,
            data: block.data,
            extension: block.extension,
            children: Vec::new(),
        };
        state.blocks.insert(id, (article, record.clone()));
        Ok(record)
    }

    async fn update_blocks_batch(&self, patches: Vec<PatchRequest>) -> Result<(), RemoteError> {
        let mut state = self.begin(RemoteCall::UpdateBlocksBatch(patches.clone()))?;
        // Validate everything first so a bad entry leaves the store untouched.
        let mut ids = Vec::with_capacity(patches.len());
        for patch in &patches {
            let id = State::remote_id(&patch.id)?;
            if !state.blocks.contains_key(&id) {
                return Err(RemoteError::NotFound(format!("block {id}")));
            }
            ids.push(id);
        }
        for (id, patch) in ids.into_iter().zip(patches) {
            let Some((_, record)) = state.blocks.get_mut(&id) else {
                continue;
            };
            let fields = patch.fields;
            if let Some(kind) = fields.kind {
                record.kind = kind;
            }
            if let Some(data) = fields.data {
                record.data = data;
            }
            if let Some(extension) = fields.extension {
                record.extension = extension;
            }
            if let Some(sequence) = fields.sequence {
                record.sequence = sequence;
            }
        }
        Ok(())
    }

    async fn delete_block(&self, id: BlockId) -> Result<(), RemoteError> {
        let mut state = self.begin(RemoteCall::DeleteBlock(id.clone()))?;
        let id = State::remote_id(&id)?;
        if !state.blocks.contains_key(&id) {
            return Err(RemoteError::NotFound(format!("block {id}")));
        }
        state.remove_subtree(id);
        Ok(())
    }

    async fn update_article(&self, id: ArticleId, patch: ArticlePatch) -> Result<(), RemoteError> {
        let mut state = self.begin(RemoteCall::UpdateArticle(id, patch.clone()))?;
        let article = state
            .articles
            .get_mut(&id)
            .ok_or_else(|| RemoteError::NotFound(format!("article {id}")))?;
        if let Some(title) = patch.title {
            article.title = title;
        }
        if let Some(namespace) = patch.namespace {
            article.namespace = namespace;
        }
        if let Some(tags) = patch.tags {
            article.tags = tags;
        }
        if let Some(extension) = patch.extension {
            article.extension = extension;
        }
        Ok(())
    }

    async fn create_child_article(
        &self,
        parent: ArticleId,
        title: String,
    ) -> Result<ArticleDef, RemoteError> {
        let mut state = self.begin(RemoteCall::CreateChildArticle(parent, title.clone()))?;
        let root = state
            .articles
            .get(&parent)
            .map(|p| p.root_id.unwrap_or(p.id))
            .ok_or_else(|| RemoteError::NotFound(format!("article {parent}")))?;
        state.next_article_id += 1;
        let mut article = ArticleDef::new(ArticleId(state.next_article_id), title);
        article.parent_id = Some(parent);
        article.root_id = Some(root);
        state.articles.insert(article.id, article.clone());
        Ok(article)
    }

    async fn export_article(&self, id: ArticleId) -> Result<ArticleDef, RemoteError> {
        let state = self.begin(RemoteCall::ExportArticle(id))?;
        state.export(id)
    }
}
