use std::collections::HashMap;
use std::sync::Arc;

use super::action::{Action, BlockPatch};
use crate::blocks::{Block, BlockRegistry};
use crate::error::EngineError;
use crate::model::{ArticleDef, BlockId, BlockRecord};
use crate::sequence::{Position, is_strictly_increasing};

/// The live block tree of one article plus its metadata.
///
/// All structural changes go through [`ArticleTree::apply`], which keeps
/// every sibling list sorted by sequence and returns the actions that revert
/// the change.
pub struct ArticleTree {
    article: ArticleDef,
    roots: Vec<Block>,
    registry: Arc<BlockRegistry>,
}

impl ArticleTree {
    pub fn new(mut article: ArticleDef, registry: Arc<BlockRegistry>) -> Self {
        let mut records = std::mem::take(&mut article.blocks);
        order_records(&mut records, None);
        let roots = records.into_iter().map(|r| registry.create(r)).collect();
        Self {
            article,
            roots,
            registry,
        }
    }

    /// Article metadata. Its `blocks` list is always empty; see [`Self::to_def`].
    pub fn article(&self) -> &ArticleDef {
        &self.article
    }

    pub fn roots(&self) -> &[Block] {
        &self.roots
    }

    pub fn registry(&self) -> &Arc<BlockRegistry> {
        &self.registry
    }

    pub fn find(&self, id: &BlockId) -> Option<&Block> {
        self.roots.iter().find_map(|block| block.find(id))
    }

    /// Children of `parent`, or the top-level blocks for `None`.
    pub fn children_of(&self, parent: Option<&BlockId>) -> Result<&[Block], EngineError> {
        match parent {
            None => Ok(&self.roots),
            Some(id) => self
                .find(id)
                .map(Block::children)
                .ok_or_else(|| EngineError::ParentNotFound(id.clone())),
        }
    }

    /// Parent id (`None` at top level) and index of block `id`.
    pub fn locate(&self, id: &BlockId) -> Option<(Option<BlockId>, usize)> {
        locate_in(&self.roots, None, id)
    }

    /// The full article, blocks included.
    pub fn to_def(&self) -> ArticleDef {
        let mut def = self.article.clone();
        def.blocks = self.roots.iter().map(Block::to_record).collect();
        def
    }

    /// Apply `action` and return the actions that revert it.
    ///
    /// Nothing is changed when an error is returned.
    pub fn apply(&mut self, action: &Action) -> Result<Vec<Action>, EngineError> {
        match action {
            Action::Insert {
                parent_id, records, ..
            } => self.insert(parent_id.as_ref(), records),
            Action::Update { id, patch } => self.update(id, patch),
            Action::Delete { id } => self.delete(id),
            Action::Reorder { id, new_sequence } => self.reorder(id, *new_sequence),
            Action::TitleUpdate { article_id, title } => {
                let previous = std::mem::replace(&mut self.article.title, title.clone());
                Ok(vec![Action::TitleUpdate {
                    article_id: *article_id,
                    title: previous,
                }])
            }
        }
    }

    /// Replace block ids (and parent links) found in `map`.
    pub fn remap(&mut self, map: &HashMap<BlockId, BlockId>) {
        for block in &mut self.roots {
            remap_block(block, map);
        }
    }

    fn find_mut(&mut self, id: &BlockId) -> Option<&mut Block> {
        find_in_mut(&mut self.roots, id)
    }

    fn children_mut(&mut self, parent: Option<&BlockId>) -> Result<&mut Vec<Block>, EngineError> {
        match parent {
            None => Ok(&mut self.roots),
            Some(id) => self
                .find_mut(id)
                .map(|block| &mut block.children)
                .ok_or_else(|| EngineError::ParentNotFound(id.clone())),
        }
    }

    fn insert(
        &mut self,
        parent: Option<&BlockId>,
        records: &[BlockRecord],
    ) -> Result<Vec<Action>, EngineError> {
        let registry = Arc::clone(&self.registry);
        let siblings = self.children_mut(parent)?;
        let mut inverse = Vec::with_capacity(records.len());
        for record in records {
            let mut record = record.clone();
            record.parent_id = parent.cloned();
            if let Some(id) = &record.id {
                inverse.push(Action::Delete { id: id.clone() });
            }
            let block = registry.create(record);
            let index = siblings.partition_point(|b| b.sequence() <= block.sequence());
            siblings.insert(index, block);
        }
        inverse.reverse();
        Ok(inverse)
    }

    fn update(&mut self, id: &BlockId, patch: &BlockPatch) -> Result<Vec<Action>, EngineError> {
        let registry = Arc::clone(&self.registry);
        let block = self
            .find_mut(id)
            .ok_or_else(|| EngineError::BlockNotFound(id.clone()))?;
        let previous = BlockPatch {
            kind: patch.kind.as_ref().map(|_| block.record.kind.clone()),
            data: patch.data.as_ref().map(|_| block.record.data.clone()),
            extension: patch.extension.as_ref().map(|_| block.record.extension.clone()),
        };
        if let Some(kind) = &patch.kind
            && *kind != block.record.kind
        {
            block.record.kind = kind.clone();
            block.behavior = registry.behavior_for(kind);
        }
        if let Some(data) = &patch.data {
            block.record.data = data.clone();
        }
        if let Some(extension) = &patch.extension {
            block.record.extension = extension.clone();
        }
        Ok(vec![Action::Update {
            id: id.clone(),
            patch: previous,
        }])
    }

    fn delete(&mut self, id: &BlockId) -> Result<Vec<Action>, EngineError> {
        let (parent, index) = self
            .locate(id)
            .ok_or_else(|| EngineError::BlockNotFound(id.clone()))?;
        let siblings = self.children_mut(parent.as_ref())?;
        let removed = siblings.remove(index);
        let after_id = index
            .checked_sub(1)
            .and_then(|prev| siblings[prev].id().cloned());
        Ok(vec![Action::Insert {
            parent_id: parent,
            after_id,
            position: Position::After,
            records: vec![removed.to_record()],
        }])
    }

    fn reorder(&mut self, id: &BlockId, sequence: f64) -> Result<Vec<Action>, EngineError> {
        let (parent, index) = self
            .locate(id)
            .ok_or_else(|| EngineError::BlockNotFound(id.clone()))?;
        let siblings = self.children_mut(parent.as_ref())?;
        let mut block = siblings.remove(index);
        let previous = block.record.sequence;
        block.record.sequence = sequence;
        let index = siblings.partition_point(|b| b.sequence() <= sequence);
        siblings.insert(index, block);
        Ok(vec![Action::Reorder {
            id: id.clone(),
            new_sequence: previous,
        }])
    }
}

/// Sort loaded siblings by sequence, keeping load order for ties, and report
/// lists that were not strictly increasing. Parent links are filled in.
fn order_records(records: &mut [BlockRecord], parent: Option<&BlockId>) {
    if !is_strictly_increasing(records) {
        match parent {
            Some(parent) => log::warn!("Children of block {parent} are not in strictly increasing sequence order"),
            None => log::warn!("Top-level blocks are not in strictly increasing sequence order"),
        }
        records.sort_by(|a, b| a.sequence.total_cmp(&b.sequence));
    }
    for record in records {
        record.parent_id = parent.cloned();
        let id = record.id.clone();
        order_records(&mut record.children, id.as_ref());
    }
}

fn locate_in(
    blocks: &[Block],
    parent: Option<&BlockId>,
    id: &BlockId,
) -> Option<(Option<BlockId>, usize)> {
    for (index, block) in blocks.iter().enumerate() {
        if block.id() == Some(id) {
            return Some((parent.cloned(), index));
        }
        if let Some(found) = locate_in(&block.children, block.id(), id) {
            return Some(found);
        }
    }
    None
}

fn find_in_mut<'a>(blocks: &'a mut [Block], id: &BlockId) -> Option<&'a mut Block> {
    for block in blocks {
        if block.id() == Some(id) {
            return Some(block);
        }
        if let Some(found) = find_in_mut(&mut block.children, id) {
            return Some(found);
        }
    }
    None
}

fn remap_block(block: &mut Block, map: &HashMap<BlockId, BlockId>) {
    for field in [&mut block.record.id, &mut block.record.parent_id] {
        if let Some(id) = field
            && let Some(new) = map.get(id)
        {
            *id = new.clone();
        }
    }
    for child in &mut block.children {
        remap_block(child, map);
    }
}
