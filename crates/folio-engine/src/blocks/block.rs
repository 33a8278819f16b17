use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::model::{BlockId, BlockRecord, Fields};

/// Nesting state threaded through markdown serialization.
///
/// Kinds render their content starting at column zero; a list indents the
/// continuation lines of its items itself, so `level` only records how deep
/// the current block sits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MarkdownContext {
    pub level: usize,
}

impl MarkdownContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// The context for content one list level deeper.
    pub fn inc(&self) -> Self {
        Self {
            level: self.level + 1,
        }
    }
}

/// Type of an editable `data` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Integer,
    Boolean,
}

/// Description of one editable `data` field of a block kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub field_type: FieldType,
    pub required: bool,
}

impl FieldSpec {
    pub const fn optional(name: &'static str, field_type: FieldType) -> Self {
        Self {
            name,
            field_type,
            required: false,
        }
    }

    pub const fn required(name: &'static str, field_type: FieldType) -> Self {
        Self {
            name,
            field_type,
            required: true,
        }
    }
}

/// Kind-specific behavior attached to a [`Block`].
///
/// One implementation is registered per kind tag in a
/// [`BlockRegistry`](crate::blocks::BlockRegistry). Each kind owns its own
/// fragment of the markdown serialization contract.
pub trait BlockBehavior: Send + Sync {
    /// The kind tag this behavior is registered under.
    fn kind(&self) -> &'static str;

    /// Serialize `block` (and its children) as markdown.
    fn to_markdown(&self, block: &Block, ctx: &MarkdownContext) -> String;

    /// Whether the block can be edited through its markdown text.
    fn is_markdown_representable(&self, _block: &Block) -> bool {
        true
    }

    /// Inline blocks are concatenated without separators inside a flow.
    fn is_inline(&self, _block: &Block) -> bool {
        false
    }

    /// Editable `data` fields beyond what markdown carries.
    fn fields(&self) -> &'static [FieldSpec] {
        &[]
    }
}

/// Runtime node wrapping exactly one [`BlockRecord`].
///
/// The wrapped record never holds children itself; they are owned as
/// [`Block`]s and reassembled by [`Block::to_record`].
#[derive(Clone)]
pub struct Block {
    pub(crate) record: BlockRecord,
    pub(crate) children: Vec<Block>,
    pub(crate) behavior: Arc<dyn BlockBehavior>,
}

impl Block {
    pub fn id(&self) -> Option<&BlockId> {
        self.record.id.as_ref()
    }

    /// The kind tag stored in the record. Unknown kinds keep their original tag.
    pub fn kind(&self) -> &str {
        &self.record.kind
    }

    /// The kind of behavior resolved by the registry (`"unknown"` for the fallback).
    pub fn behavior_kind(&self) -> &'static str {
        self.behavior.kind()
    }

    pub fn sequence(&self) -> f64 {
        self.record.sequence
    }

    pub fn data(&self) -> &Fields {
        &self.record.data
    }

    pub fn extension(&self) -> &Fields {
        &self.record.extension
    }

    pub fn parent_id(&self) -> Option<&BlockId> {
        self.record.parent_id.as_ref()
    }

    pub fn children(&self) -> &[Block] {
        &self.children
    }

    pub fn text_field(&self, key: &str) -> Option<&str> {
        self.record.text_field(key)
    }

    pub fn bool_field(&self, key: &str) -> bool {
        self.record
            .data
            .get(key)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// The record without its children.
    pub fn record(&self) -> &BlockRecord {
        &self.record
    }

    /// Rebuild the full record, children included.
    pub fn to_record(&self) -> BlockRecord {
        let mut record = self.record.clone();
        record.children = self.children.iter().map(Block::to_record).collect();
        record
    }

    pub fn to_markdown(&self, ctx: &MarkdownContext) -> String {
        self.behavior.to_markdown(self, ctx)
    }

    pub fn is_markdown_representable(&self) -> bool {
        self.behavior.is_markdown_representable(self)
    }

    pub fn is_inline(&self) -> bool {
        self.behavior.is_inline(self)
    }

    pub fn fields(&self) -> &'static [FieldSpec] {
        self.behavior.fields()
    }

    /// Depth-first search for a descendant (or self) with `id`.
    pub fn find(&self, id: &BlockId) -> Option<&Block> {
        if self.id() == Some(id) {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }

    /// Collect this block's id and every descendant id.
    pub fn subtree_ids(&self) -> Vec<BlockId> {
        let mut ids = Vec::new();
        self.collect_ids(&mut ids);
        ids
    }

    fn collect_ids(&self, ids: &mut Vec<BlockId>) {
        if let Some(id) = self.id() {
            ids.push(id.clone());
        }
        for child in &self.children {
            child.collect_ids(ids);
        }
    }
}

impl fmt::Debug for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Block")
            .field("id", &self.record.id)
            .field("kind", &self.record.kind)
            .field("sequence", &self.record.sequence)
            .field("data", &self.record.data)
            .field("children", &self.children)
            .finish()
    }
}
