use crate::blocks::{Block, BlockBehavior, MarkdownContext};

/// Hard line break.
pub struct Br;

impl Br {
    pub const KIND: &'static str = "br";
}

impl BlockBehavior for Br {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn to_markdown(&self, _block: &Block, _ctx: &MarkdownContext) -> String {
        "  \n".to_string()
    }

    fn is_inline(&self, _block: &Block) -> bool {
        true
    }
}
