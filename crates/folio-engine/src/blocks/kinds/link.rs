use crate::blocks::{Block, BlockBehavior, FieldSpec, FieldType, MarkdownContext};
use crate::markdown::escape::escape_inline;

/// Inline link `[text](url "title")`.
pub struct Link;

impl Link {
    pub const KIND: &'static str = "link";
}

impl BlockBehavior for Link {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn to_markdown(&self, block: &Block, _ctx: &MarkdownContext) -> String {
        let text = escape_inline(block.text_field("text").unwrap_or_default());
        let url = block.text_field("url").unwrap_or_default();
        format!(
            "[{text}]({}{})",
            destination(url),
            title(block.text_field("title"))
        )
    }

    fn is_inline(&self, _block: &Block) -> bool {
        true
    }

    fn fields(&self) -> &'static [FieldSpec] {
        const FIELDS: &[FieldSpec] = &[
            FieldSpec::required("url", FieldType::String),
            FieldSpec::optional("text", FieldType::String),
            FieldSpec::optional("title", FieldType::String),
        ];
        FIELDS
    }
}

/// Link destination, angle-bracketed when it would not survive bare.
pub(crate) fn destination(url: &str) -> String {
    if url.is_empty() || url.contains([' ', '(', ')', '<', '>']) {
        format!("<{}>", url.replace('<', "%3C").replace('>', "%3E"))
    } else {
        url.to_string()
    }
}

/// Optional ` "title"` suffix.
pub(crate) fn title(title: Option<&str>) -> String {
    match title {
        Some(title) if !title.is_empty() => {
            format!(" \"{}\"", title.replace('\\', "\\\\").replace('"', "\\\""))
        }
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use crate::blocks::{BlockRegistry, MarkdownContext};
    use crate::model::BlockRecord;

    #[test]
    fn renders_title_when_present() {
        let registry = BlockRegistry::with_builtin();
        let with_title = registry.create(
            BlockRecord::new("link")
                .with("text", "Example")
                .with("url", "https://example.com")
                .with("title", "Example Site"),
        );
        let without = registry.create(
            BlockRecord::new("link")
                .with("text", "Example")
                .with("url", "https://example.com"),
        );

        let ctx = MarkdownContext::new();
        assert_eq!(
            with_title.to_markdown(&ctx),
            r#"[Example](https://example.com "Example Site")"#
        );
        assert_eq!(without.to_markdown(&ctx), "[Example](https://example.com)");
    }

    #[test]
    fn brackets_urls_with_spaces() {
        let block = BlockRegistry::with_builtin().create(
            BlockRecord::new("link")
                .with("text", "doc")
                .with("url", "my file.md"),
        );
        assert_eq!(
            block.to_markdown(&MarkdownContext::new()),
            "[doc](<my file.md>)"
        );
    }
}
