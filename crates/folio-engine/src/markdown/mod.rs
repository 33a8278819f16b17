//! Markdown transcoding: text to block records and blocks back to text.
//!
//! Parsing goes through pulldown-cmark into a [`tokens::Token`] tree and then
//! through one record construction rule per token. Serializing is owned by
//! the block kinds themselves (see [`crate::blocks::kinds`]).

pub mod escape;
pub mod records;
pub mod tokens;

use crate::blocks::{Block, BlockRegistry, MarkdownContext};
use crate::model::BlockRecord;

/// Kind of the synthetic container wrapping several top-level blocks.
pub const WRAPPER_KIND: &str = "item";

/// Parse `src` into a single record.
///
/// Several top-level blocks are wrapped in an `item` container, with
/// `separator` records where the source had blank lines. Empty or
/// whitespace-only input yields `None`.
pub fn parse(src: &str) -> Option<BlockRecord> {
    let mut parsed = records::records(tokens::tokenize(src));
    match parsed.len() {
        0 => None,
        1 => parsed.pop(),
        _ => Some(BlockRecord::new(WRAPPER_KIND).with_children(parsed)),
    }
}

/// Serialize a block tree.
pub fn serialize(block: &Block) -> String {
    block.to_markdown(&MarkdownContext::new())
}

/// Serialize top-level blocks as one document, blank line separated.
pub fn serialize_all(blocks: &[Block]) -> String {
    blocks
        .iter()
        .map(serialize)
        .filter(|md| !md.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// `serialize(parse(src))`, the canonical form of `src`.
pub fn canonicalize(registry: &BlockRegistry, src: &str) -> Option<String> {
    parse(src).map(|record| serialize(&registry.create(record)))
}
