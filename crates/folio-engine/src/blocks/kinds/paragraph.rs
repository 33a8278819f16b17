use crate::blocks::{Block, BlockBehavior, MarkdownContext};
use crate::markdown::escape::{escape_inline, escape_line_starts};

use super::inline;

/// A paragraph of inline children.
pub struct Paragraph;

impl Paragraph {
    pub const KIND: &'static str = "paragraph";
}

impl BlockBehavior for Paragraph {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn to_markdown(&self, block: &Block, ctx: &MarkdownContext) -> String {
        let content = if block.children().is_empty() {
            escape_inline(block.text_field("text").unwrap_or_default())
        } else {
            inline(block.children(), ctx)
        };
        escape_line_starts(content.trim_end())
    }
}
