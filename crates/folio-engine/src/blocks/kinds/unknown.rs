use crate::blocks::{Block, BlockBehavior, MarkdownContext};

/// Fallback for kinds without a registration.
///
/// The record is kept untouched so saving the article never loses data, but
/// it has no markdown form and cannot be edited as text.
pub struct Unknown;

impl Unknown {
    pub const KIND: &'static str = "unknown";
}

impl BlockBehavior for Unknown {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn to_markdown(&self, _block: &Block, _ctx: &MarkdownContext) -> String {
        String::new()
    }

    fn is_markdown_representable(&self, _block: &Block) -> bool {
        false
    }
}
