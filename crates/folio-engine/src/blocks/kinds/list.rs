use serde_json::Value;

use crate::blocks::{Block, BlockBehavior, FieldSpec, FieldType, MarkdownContext};

use super::Item;

/// Bullet or ordered list. Children are normally `item`s.
pub struct List;

impl List {
    pub const KIND: &'static str = "list";
    pub const BULLET: &'static str = "-";

    fn start(block: &Block) -> u64 {
        block.data().get("start").and_then(Value::as_u64).unwrap_or(1)
    }
}

impl BlockBehavior for List {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn to_markdown(&self, block: &Block, ctx: &MarkdownContext) -> String {
        let ordered = block.bool_field("ordered");
        let start = Self::start(block);
        let nested = ctx.inc();
        let mut lines = Vec::with_capacity(block.children().len());
        let mut number = start;
        for child in block.children() {
            if child.behavior_kind() == List::KIND {
                // A list directly inside a list hangs off the previous item.
                lines.push(format!("  {}", indent(&child.to_markdown(&nested), "  ")));
                continue;
            }
            let marker = if ordered {
                let marker = format!("{number}.");
                number += 1;
                marker
            } else {
                Self::BULLET.to_string()
            };
            let body = if child.behavior_kind() == Item::KIND {
                Item::list_body(child, &nested)
            } else {
                child.to_markdown(&nested)
            };
            let pad = " ".repeat(marker.len() + 1);
            if body.is_empty() {
                lines.push(marker);
            } else {
                lines.push(format!("{marker} {}", indent(&body, &pad)));
            }
        }
        lines.join("\n")
    }

    fn fields(&self) -> &'static [FieldSpec] {
        const FIELDS: &[FieldSpec] = &[
            FieldSpec::optional("ordered", FieldType::Boolean),
            FieldSpec::optional("start", FieldType::Integer),
        ];
        FIELDS
    }
}

/// Indent every line after the first by `pad`, leaving blank lines empty.
fn indent(text: &str, pad: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
            if !line.is_empty() {
                out.push_str(pad);
            }
        }
        out.push_str(line);
    }
    out
}
