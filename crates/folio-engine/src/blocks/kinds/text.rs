use crate::blocks::{Block, BlockBehavior, FieldSpec, FieldType, MarkdownContext};
use crate::markdown::escape::escape_inline;

use super::{codespan, inline};

/// A run of inline text, optionally styled.
///
/// `data.style` is one of `strong`, `em`, `del` or `codespan`. A styled run
/// either holds its text directly or wraps nested inline children.
pub struct Text;

impl Text {
    pub const KIND: &'static str = "text";
}

impl BlockBehavior for Text {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn to_markdown(&self, block: &Block, ctx: &MarkdownContext) -> String {
        styled_text(block, ctx)
    }

    fn is_inline(&self, _block: &Block) -> bool {
        true
    }

    fn fields(&self) -> &'static [FieldSpec] {
        const FIELDS: &[FieldSpec] = &[
            FieldSpec::required("text", FieldType::String),
            FieldSpec::optional("style", FieldType::String),
        ];
        FIELDS
    }
}

/// The "type here" sentinel at the end of an article.
///
/// Serializes like text; the engine treats edits committed through it as
/// appends to the end of the article.
pub struct Input;

impl Input {
    pub const KIND: &'static str = "input";
}

impl BlockBehavior for Input {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn to_markdown(&self, block: &Block, ctx: &MarkdownContext) -> String {
        styled_text(block, ctx)
    }

    fn fields(&self) -> &'static [FieldSpec] {
        const FIELDS: &[FieldSpec] = &[FieldSpec::optional("text", FieldType::String)];
        FIELDS
    }
}

fn styled_text(block: &Block, ctx: &MarkdownContext) -> String {
    let style = block.text_field("style");
    if style == Some("codespan") {
        return codespan::fence(block.text_field("text").unwrap_or_default());
    }
    let content = if block.children().is_empty() {
        escape_inline(block.text_field("text").unwrap_or_default())
    } else {
        inline(block.children(), ctx)
    };
    if content.is_empty() {
        return content;
    }
    match style {
        Some("strong") => format!("**{content}**"),
        Some("em") => format!("*{content}*"),
        Some("del") => format!("~~{content}~~"),
        _ => content,
    }
}

#[cfg(test)]
mod tests {
    use crate::blocks::{BlockRegistry, MarkdownContext};
    use crate::model::BlockRecord;
    use rstest::rstest;

    #[rstest]
    #[case(None, "plain")]
    #[case(Some("strong"), "**plain**")]
    #[case(Some("em"), "*plain*")]
    #[case(Some("del"), "~~plain~~")]
    #[case(Some("codespan"), "`plain`")]
    fn renders_styles(#[case] style: Option<&str>, #[case] expected: &str) {
        let mut record = BlockRecord::new("text").with("text", "plain");
        if let Some(style) = style {
            record = record.with("style", style);
        }
        let block = BlockRegistry::with_builtin().create(record);
        assert_eq!(block.to_markdown(&MarkdownContext::new()), expected);
    }

    #[test]
    fn styled_run_wraps_nested_children() {
        let record = BlockRecord::new("text").with("style", "strong").with_children(vec![
            BlockRecord::new("text").with("text", "bold "),
            BlockRecord::new("text").with("text", "and it").with("style", "em"),
        ]);
        let block = BlockRegistry::with_builtin().create(record);
        assert_eq!(
            block.to_markdown(&MarkdownContext::new()),
            "**bold *and it***"
        );
    }

    #[test]
    fn empty_styled_text_renders_nothing() {
        let record = BlockRecord::new("text").with("text", "").with("style", "strong");
        let block = BlockRegistry::with_builtin().create(record);
        assert_eq!(block.to_markdown(&MarkdownContext::new()), "");
    }
}
