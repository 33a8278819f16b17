use crate::blocks::{Block, BlockBehavior, FieldSpec, FieldType, MarkdownContext};

use super::codespan::longest_run;

/// Fenced code block.
pub struct Code;

impl Code {
    pub const KIND: &'static str = "code";
}

impl BlockBehavior for Code {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn to_markdown(&self, block: &Block, _ctx: &MarkdownContext) -> String {
        let language = block.text_field("language").unwrap_or_default();
        let code = block.text_field("code").unwrap_or_default();
        let fence = "`".repeat(longest_run(code, '`').max(2) + 1);
        if code.is_empty() {
            format!("{fence}{language}\n{fence}")
        } else {
            format!("{fence}{language}\n{code}\n{fence}")
        }
    }

    fn fields(&self) -> &'static [FieldSpec] {
        const FIELDS: &[FieldSpec] = &[
            FieldSpec::required("code", FieldType::String),
            FieldSpec::optional("language", FieldType::String),
            FieldSpec::optional("theme", FieldType::String),
        ];
        FIELDS
    }
}

#[cfg(test)]
mod tests {
    use crate::blocks::{BlockRegistry, MarkdownContext};
    use crate::model::BlockRecord;

    #[test]
    fn lengthens_fence_around_backticks() {
        let block = BlockRegistry::with_builtin().create(
            BlockRecord::new("code")
                .with("language", "md")
                .with("code", "```\ninner\n```"),
        );
        assert_eq!(
            block.to_markdown(&MarkdownContext::new()),
            "````md\n```\ninner\n```\n````"
        );
    }
}
