use crate::blocks::{Block, BlockBehavior, MarkdownContext};

use super::{Paragraph, flow};

/// Generic container: a list item, or the wrapper the parser puts around
/// several top-level blocks.
pub struct Item;

impl Item {
    pub const KIND: &'static str = "item";

    /// Body of `item` when rendered under a list marker.
    ///
    /// A tight item (no paragraph children) keeps its nested blocks on the
    /// next line so it stays tight when parsed again.
    pub fn list_body(item: &Block, ctx: &MarkdownContext) -> String {
        let loose = item
            .children()
            .iter()
            .any(|child| child.behavior_kind() == Paragraph::KIND);
        let sep = if loose { "\n\n" } else { "\n" };
        flow(item.children(), ctx, sep)
    }
}

impl BlockBehavior for Item {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn to_markdown(&self, block: &Block, ctx: &MarkdownContext) -> String {
        flow(block.children(), ctx, "\n\n")
    }
}
