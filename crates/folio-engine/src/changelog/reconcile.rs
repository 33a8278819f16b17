//! Committing the text of an inline editor back into the block tree.
//!
//! The edited text is parsed and the result is merged into the edited block
//! where the kinds agree. Extra blocks typed into the same editor become new
//! siblings, so one editor can fan out into several blocks while the edited
//! block keeps its identity and position.

use super::action::BlockPatch;
use super::article::ArticleInstance;
use crate::blocks::kinds::{Item, Separator};
use crate::error::EngineError;
use crate::markdown::{self, WRAPPER_KIND};
use crate::model::{BlockId, BlockRecord};
use crate::sequence::{InsertTarget, Position};

/// Which editor lost focus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditTarget {
    /// The editor of an existing block.
    Block(BlockId),
    /// The empty "type here" input after the last top-level block.
    Input,
}

/// What a committed edit did to the tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditOutcome {
    /// Canonical markdown of the edited block, to reset the editor with.
    /// `None` when the edited block is gone or the edit went through the input.
    pub canonical: Option<String>,
    /// Top-level ids of the blocks inserted next to (or into) the edited one.
    pub inserted: Vec<BlockId>,
    /// The edited block, when the edit replaced or removed it.
    pub deleted: Option<BlockId>,
}

impl ArticleInstance {
    /// Reconcile edited `text` against the block behind `target`.
    ///
    /// - same kind: merged into the block in place;
    /// - several blocks containing one of the block's kind: that one is merged,
    ///   the others are inserted before and after it;
    /// - a single block typed into an empty `item`: inserted as its child;
    /// - anything else replaces the block at its position.
    ///
    /// Text that parses to nothing leaves the tree and the queue untouched.
    pub fn commit_text_edit(
        &mut self,
        target: &EditTarget,
        text: &str,
    ) -> Result<EditOutcome, EngineError> {
        let id = match target {
            EditTarget::Input => return self.commit_input(text),
            EditTarget::Block(id) => id,
        };
        let (parent, _) = self
            .locate(id)
            .ok_or_else(|| EngineError::BlockNotFound(id.clone()))?;
        let kind = self
            .find(id)
            .map(|block| block.kind().to_string())
            .ok_or_else(|| EngineError::BlockNotFound(id.clone()))?;

        let Some(mut parsed) = markdown::parse(text) else {
            return Ok(EditOutcome::default());
        };

        let mut outcome = EditOutcome::default();
        if parsed.kind == kind {
            if kind == WRAPPER_KIND {
                parsed.children.retain(|child| child.kind != Separator::KIND);
            }
            self.merge_record(id, parsed)?;
        } else if parsed.kind == WRAPPER_KIND {
            let blocks: Vec<BlockRecord> = parsed
                .children
                .into_iter()
                .filter(|child| child.kind != Separator::KIND)
                .collect();
            match blocks.iter().position(|child| child.kind == kind) {
                Some(matched) => {
                    let mut before = blocks;
                    let after = before.split_off(matched + 1);
                    let Some(record) = before.pop() else {
                        return Ok(outcome);
                    };
                    self.merge_record(id, record)?;
                    outcome.inserted = self.insert_blocks(
                        parent.as_ref(),
                        &InsertTarget::Block(id.clone()),
                        Position::Before,
                        before,
                    )?;
                    let inserted_after = self.insert_blocks(
                        parent.as_ref(),
                        &InsertTarget::Block(id.clone()),
                        Position::After,
                        after,
                    )?;
                    outcome.inserted.extend(inserted_after);
                }
                None => return self.replace(id, parent.as_ref(), blocks),
            }
        } else if kind == Item::KIND && self.find(id).is_some_and(|b| b.children().is_empty()) {
            outcome.inserted =
                self.insert_blocks(Some(id), &InsertTarget::End, Position::After, vec![parsed])?;
        } else {
            return self.replace(id, parent.as_ref(), vec![parsed]);
        }

        outcome.canonical = self.find(id).map(markdown::serialize);
        Ok(outcome)
    }

    /// Text typed into the input becomes new top-level blocks at the end.
    fn commit_input(&mut self, text: &str) -> Result<EditOutcome, EngineError> {
        let Some(parsed) = markdown::parse(text) else {
            return Ok(EditOutcome::default());
        };
        let records = if parsed.kind == WRAPPER_KIND {
            parsed
                .children
                .into_iter()
                .filter(|child| child.kind != Separator::KIND)
                .collect()
        } else {
            vec![parsed]
        };
        let inserted = self.insert_blocks(None, &InsertTarget::End, Position::After, records)?;
        Ok(EditOutcome {
            inserted,
            ..Default::default()
        })
    }

    /// Put `records` where `id` is and remove `id`.
    fn replace(
        &mut self,
        id: &BlockId,
        parent: Option<&BlockId>,
        records: Vec<BlockRecord>,
    ) -> Result<EditOutcome, EngineError> {
        let inserted = self.insert_blocks(
            parent,
            &InsertTarget::Block(id.clone()),
            Position::Before,
            records,
        )?;
        self.delete_block(id)?;
        Ok(EditOutcome {
            canonical: None,
            inserted,
            deleted: Some(id.clone()),
        })
    }

    /// Structural merge of `parsed` into block `id`.
    ///
    /// Kind and data are patched when they differ (extension is kept).
    /// Children are merged pairwise by index, surplus existing children are
    /// deleted and extra parsed children are appended.
    fn merge_record(&mut self, id: &BlockId, parsed: BlockRecord) -> Result<(), EngineError> {
        let block = self
            .find(id)
            .ok_or_else(|| EngineError::BlockNotFound(id.clone()))?;
        let patch = BlockPatch {
            kind: (block.kind() != parsed.kind).then(|| parsed.kind.clone()),
            data: (*block.data() != parsed.data).then(|| parsed.data.clone()),
            extension: None,
        };
        let existing: Vec<BlockId> = block
            .children()
            .iter()
            .filter_map(|child| child.id().cloned())
            .collect();

        self.update_block(id, patch)?;

        let parsed_len = parsed.children.len();
        let mut parsed_children = parsed.children.into_iter();
        for child_id in existing.iter().take(parsed_len) {
            if let Some(child) = parsed_children.next() {
                self.merge_record(child_id, child)?;
            }
        }
        for surplus in existing.iter().skip(parsed_len) {
            self.delete_block(surplus)?;
        }

        let extra: Vec<BlockRecord> = parsed_children.collect();
        if !extra.is_empty() {
            let target = match existing.last() {
                Some(last) => InsertTarget::Block(last.clone()),
                None => InsertTarget::End,
            };
            self.insert_blocks(Some(id), &target, Position::After, extra)?;
        }
        Ok(())
    }
}
