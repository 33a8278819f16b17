use crate::blocks::{Block, BlockBehavior, FieldSpec, FieldType, MarkdownContext};

/// Raw HTML, either a whole block or an inline tag.
///
/// `data.inline` marks tags that sit inside running text, so a flow keeps
/// them in the surrounding run.
pub struct Html;

impl Html {
    pub const KIND: &'static str = "html";
}

impl BlockBehavior for Html {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn to_markdown(&self, block: &Block, _ctx: &MarkdownContext) -> String {
        block
            .text_field("raw")
            .or_else(|| block.text_field("text"))
            .unwrap_or_default()
            .to_string()
    }

    fn is_inline(&self, block: &Block) -> bool {
        block.bool_field("inline")
    }

    fn fields(&self) -> &'static [FieldSpec] {
        const FIELDS: &[FieldSpec] = &[
            FieldSpec::required("raw", FieldType::String),
            FieldSpec::optional("inline", FieldType::Boolean),
        ];
        FIELDS
    }
}
