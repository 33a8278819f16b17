use crate::blocks::{Block, BlockBehavior, FieldSpec, FieldType, MarkdownContext};
use crate::markdown::escape::escape_inline;

use super::link::{destination, title};

/// Image `![alt](url "caption")`. The caption travels as the markdown title.
pub struct Image;

impl Image {
    pub const KIND: &'static str = "image";
}

impl BlockBehavior for Image {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn to_markdown(&self, block: &Block, _ctx: &MarkdownContext) -> String {
        let alt = escape_inline(block.text_field("alt").unwrap_or_default());
        let url = block.text_field("url").unwrap_or_default();
        format!(
            "![{alt}]({}{})",
            destination(url),
            title(block.text_field("caption"))
        )
    }

    fn is_inline(&self, _block: &Block) -> bool {
        true
    }

    fn fields(&self) -> &'static [FieldSpec] {
        const FIELDS: &[FieldSpec] = &[
            FieldSpec::required("url", FieldType::String),
            FieldSpec::optional("alt", FieldType::String),
            FieldSpec::optional("caption", FieldType::String),
        ];
        FIELDS
    }
}
