use serde_json::Value;

use crate::blocks::{Block, BlockBehavior, FieldSpec, FieldType, MarkdownContext};
use crate::markdown::escape::escape_inline;

use super::inline;

/// ATX heading. `data.level` is clamped to 1..=6.
pub struct Heading;

impl Heading {
    pub const KIND: &'static str = "heading";

    pub fn level(block: &Block) -> usize {
        let level = block.data().get("level").and_then(Value::as_u64).unwrap_or(1);
        level.clamp(1, 6) as usize
    }
}

impl BlockBehavior for Heading {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn to_markdown(&self, block: &Block, ctx: &MarkdownContext) -> String {
        let marker = "#".repeat(Self::level(block));
        let content = if block.children().is_empty() {
            escape_inline(block.text_field("text").unwrap_or_default())
        } else {
            inline(block.children(), ctx)
        };
        let content = content.trim().replace('\n', " ");
        if content.is_empty() {
            marker
        } else {
            format!("{marker} {content}")
        }
    }

    fn fields(&self) -> &'static [FieldSpec] {
        const FIELDS: &[FieldSpec] = &[
            FieldSpec::required("level", FieldType::Integer),
            FieldSpec::optional("text", FieldType::String),
        ];
        FIELDS
    }
}

#[cfg(test)]
mod tests {
    use crate::blocks::{BlockRegistry, MarkdownContext};
    use crate::model::BlockRecord;
    use rstest::rstest;

    #[rstest]
    #[case(1, "# Title")]
    #[case(3, "### Title")]
    #[case(0, "# Title")]
    #[case(9, "###### Title")]
    fn clamps_level(#[case] level: i64, #[case] expected: &str) {
        let block = BlockRegistry::with_builtin().create(
            BlockRecord::new("heading")
                .with("level", level)
                .with("text", "Title"),
        );
        assert_eq!(block.to_markdown(&MarkdownContext::new()), expected);
    }
}
