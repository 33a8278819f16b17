use crate::blocks::{Block, BlockBehavior, FieldSpec, FieldType, MarkdownContext};

/// Inline code.
pub struct Codespan;

impl Codespan {
    pub const KIND: &'static str = "codespan";
}

impl BlockBehavior for Codespan {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn to_markdown(&self, block: &Block, _ctx: &MarkdownContext) -> String {
        fence(block.text_field("text").unwrap_or_default())
    }

    fn is_inline(&self, _block: &Block) -> bool {
        true
    }

    fn fields(&self) -> &'static [FieldSpec] {
        const FIELDS: &[FieldSpec] = &[FieldSpec::required("text", FieldType::String)];
        FIELDS
    }
}

/// Wrap `code` in a backtick fence longer than any backtick run it contains.
///
/// Content touching the fence with a space or backtick gets one padding space
/// on each side, which the parser strips again.
pub(crate) fn fence(code: &str) -> String {
    let longest = longest_run(code, '`');
    let ticks = "`".repeat(longest + 1);
    let needs_padding = !code.trim().is_empty()
        && (code.starts_with([' ', '`']) || code.ends_with([' ', '`']));
    if needs_padding {
        format!("{ticks} {code} {ticks}")
    } else {
        format!("{ticks}{code}{ticks}")
    }
}

pub(crate) fn longest_run(text: &str, ch: char) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for c in text.chars() {
        if c == ch {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}
