use crate::blocks::{Block, BlockBehavior, FieldSpec, FieldType, MarkdownContext};

/// Thematic break. Keeps the source spelling (`***`, `___`) when known.
pub struct Hr;

impl Hr {
    pub const KIND: &'static str = "hr";
    pub const DEFAULT: &'static str = "---";
}

impl BlockBehavior for Hr {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn to_markdown(&self, block: &Block, _ctx: &MarkdownContext) -> String {
        block
            .text_field("raw")
            .filter(|raw| !raw.trim().is_empty())
            .unwrap_or(Self::DEFAULT)
            .to_string()
    }

    fn fields(&self) -> &'static [FieldSpec] {
        const FIELDS: &[FieldSpec] = &[FieldSpec::optional("raw", FieldType::String)];
        FIELDS
    }
}
