use crate::blocks::{Block, BlockBehavior, MarkdownContext};

use super::flow;

/// Block quote. Every line of the rendered children gets a `> ` prefix.
pub struct Blockquote;

impl Blockquote {
    pub const KIND: &'static str = "blockquote";
}

impl BlockBehavior for Blockquote {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn to_markdown(&self, block: &Block, ctx: &MarkdownContext) -> String {
        let content = flow(block.children(), ctx, "\n\n");
        if content.is_empty() {
            return ">".to_string();
        }
        content
            .split('\n')
            .map(|line| format!("> {line}").trim_end().to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }
}
