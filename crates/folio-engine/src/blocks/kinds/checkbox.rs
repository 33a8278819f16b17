use crate::blocks::{Block, BlockBehavior, FieldSpec, FieldType, MarkdownContext};

/// Task marker at the start of a list item.
pub struct Checkbox;

impl Checkbox {
    pub const KIND: &'static str = "checkbox";
}

impl BlockBehavior for Checkbox {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn to_markdown(&self, block: &Block, _ctx: &MarkdownContext) -> String {
        if block.bool_field("checked") {
            "[x] ".to_string()
        } else {
            "[ ] ".to_string()
        }
    }

    fn is_inline(&self, _block: &Block) -> bool {
        true
    }

    fn fields(&self) -> &'static [FieldSpec] {
        const FIELDS: &[FieldSpec] = &[FieldSpec::required("checked", FieldType::Boolean)];
        FIELDS
    }
}
