use crate::blocks::{Block, BlockBehavior, MarkdownContext};

/// Marks a blank-line boundary between parsed blocks. Renders as nothing.
pub struct Separator;

impl Separator {
    pub const KIND: &'static str = "separator";
}

impl BlockBehavior for Separator {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn to_markdown(&self, _block: &Block, _ctx: &MarkdownContext) -> String {
        String::new()
    }
}
