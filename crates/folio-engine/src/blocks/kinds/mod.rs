//! Built-in block kinds.
//!
//! Every kind owns its markdown fragment; containers call into their
//! children through [`Block::to_markdown`] and never special-case a child's
//! syntax.

use std::sync::Arc;

use super::{Block, BlockBehavior, MarkdownContext};

pub mod blockquote;
pub mod br;
pub mod checkbox;
pub mod code;
pub mod codespan;
pub mod heading;
pub mod hr;
pub mod html;
pub mod image;
pub mod item;
pub mod link;
pub mod list;
pub mod paragraph;
pub mod separator;
pub mod table;
pub mod text;
pub mod unknown;

pub use blockquote::Blockquote;
pub use br::Br;
pub use checkbox::Checkbox;
pub use code::Code;
pub use codespan::Codespan;
pub use heading::Heading;
pub use hr::Hr;
pub use html::Html;
pub use image::Image;
pub use item::Item;
pub use link::Link;
pub use list::List;
pub use paragraph::Paragraph;
pub use separator::Separator;
pub use table::{Table, TableCell, TableRow};
pub use text::{Input, Text};
pub use unknown::Unknown;

/// Every kind the engine ships with.
pub fn builtin() -> Vec<Arc<dyn BlockBehavior>> {
    vec![
        Arc::new(Heading),
        Arc::new(Paragraph),
        Arc::new(Text),
        Arc::new(Input),
        Arc::new(List),
        Arc::new(Item),
        Arc::new(Table),
        Arc::new(TableRow),
        Arc::new(TableCell),
        Arc::new(Code),
        Arc::new(Blockquote),
        Arc::new(Link),
        Arc::new(Image),
        Arc::new(Hr),
        Arc::new(Br),
        Arc::new(Separator),
        Arc::new(Html),
        Arc::new(Checkbox),
        Arc::new(Codespan),
    ]
}

/// Concatenate children with no separator, as inline content.
pub(crate) fn inline(children: &[Block], ctx: &MarkdownContext) -> String {
    children.iter().map(|child| child.to_markdown(ctx)).collect()
}

/// Lay out a mixed sequence of inline and block children.
///
/// Consecutive inline children form one run; runs and blocks are joined by
/// `sep`. Separators and children rendering to nothing are dropped.
pub(crate) fn flow(children: &[Block], ctx: &MarkdownContext, sep: &str) -> String {
    let mut parts: Vec<String> = Vec::new();
    let mut run = String::new();
    for child in children {
        if child.behavior_kind() == Separator::KIND {
            push_part(&mut parts, std::mem::take(&mut run));
        } else if child.is_inline() {
            run.push_str(&child.to_markdown(ctx));
        } else {
            push_part(&mut parts, std::mem::take(&mut run));
            push_part(&mut parts, child.to_markdown(ctx));
        }
    }
    push_part(&mut parts, run);
    parts.join(sep)
}

fn push_part(parts: &mut Vec<String>, part: String) {
    if !part.trim().is_empty() {
        parts.push(part);
    }
}
