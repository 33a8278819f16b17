use pulldown_cmark::{Alignment, CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag};

/// Generic token tree produced from markdown source.
///
/// This is a thin structural view over pulldown-cmark's event stream: one
/// variant per construct the block model knows about, with adjacent text
/// already merged.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Heading { level: u8, children: Vec<Token> },
    Paragraph(Vec<Token>),
    Text(String),
    Codespan(String),
    Code { language: String, code: String },
    Blockquote(Vec<Token>),
    List { ordered: bool, start: u64, items: Vec<Token> },
    ListItem(Vec<Token>),
    /// Task list marker, `true` when checked.
    Task(bool),
    Table { align: Vec<Alignment>, rows: Vec<Token> },
    TableRow(Vec<Token>),
    TableCell(Vec<Token>),
    Strong(Vec<Token>),
    Emphasis(Vec<Token>),
    Strikethrough(Vec<Token>),
    Link { url: String, title: String, children: Vec<Token> },
    Image { url: String, title: String, children: Vec<Token> },
    Rule { raw: String },
    Html { raw: String, inline: bool },
    HardBreak,
    /// Blank line(s) between two top-level blocks.
    Space,
}

fn options() -> Options {
    Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS
}

enum Frame {
    Root,
    Paragraph,
    Heading(u8),
    Blockquote,
    Code { language: String, code: String },
    Html(String),
    List { ordered: bool, start: u64 },
    Item,
    Table(Vec<Alignment>),
    TableRow,
    TableCell,
    Strong,
    Emphasis,
    Strikethrough,
    Link { url: String, title: String },
    Image { url: String, title: String },
    /// Constructs without a block kind; their content is kept inline.
    Transparent,
}

struct Open {
    frame: Frame,
    children: Vec<Token>,
}

/// Tokenize `src` into top-level tokens.
pub fn tokenize(src: &str) -> Vec<Token> {
    let mut stack = vec![Open {
        frame: Frame::Root,
        children: Vec::new(),
    }];
    let mut last_top_end: Option<usize> = None;

    for (event, range) in Parser::new_ext(src, options()).into_offset_iter() {
        if stack.len() == 1 && matches!(event, Event::Start(_) | Event::Rule | Event::Html(_)) {
            if let Some(end) = last_top_end
                && has_blank_line(src, end, range.start)
            {
                push(&mut stack, Token::Space);
            }
        }
        match event {
            Event::Start(tag) => {
                let frame = match tag {
                    Tag::Paragraph => Frame::Paragraph,
                    Tag::Heading { level, .. } => Frame::Heading(heading_level(level)),
                    Tag::BlockQuote(_) => Frame::Blockquote,
                    Tag::CodeBlock(kind) => Frame::Code {
                        language: match kind {
                            CodeBlockKind::Fenced(info) => {
                                info.split_whitespace().next().unwrap_or_default().to_string()
                            }
                            CodeBlockKind::Indented => String::new(),
                        },
                        code: String::new(),
                    },
                    Tag::HtmlBlock => Frame::Html(String::new()),
                    Tag::List(start) => Frame::List {
                        ordered: start.is_some(),
                        start: start.unwrap_or(1),
                    },
                    Tag::Item => Frame::Item,
                    Tag::Table(align) => Frame::Table(align),
                    Tag::TableHead | Tag::TableRow => Frame::TableRow,
                    Tag::TableCell => Frame::TableCell,
                    Tag::Emphasis => Frame::Emphasis,
                    Tag::Strong => Frame::Strong,
                    Tag::Strikethrough => Frame::Strikethrough,
                    Tag::Link {
                        dest_url, title, ..
                    } => Frame::Link {
                        url: dest_url.to_string(),
                        title: title.to_string(),
                    },
                    Tag::Image {
                        dest_url, title, ..
                    } => Frame::Image {
                        url: dest_url.to_string(),
                        title: title.to_string(),
                    },
                    _ => Frame::Transparent,
                };
                stack.push(Open {
                    frame,
                    children: Vec::new(),
                });
            }
            Event::End(_) => {
                close(&mut stack);
                if stack.len() == 1 {
                    last_top_end = Some(range.end);
                }
            }
            Event::Text(text) => match stack.last_mut().map(|open| &mut open.frame) {
                Some(Frame::Code { code, .. }) => code.push_str(&text),
                Some(Frame::Html(raw)) => raw.push_str(&text),
                _ => push_text(&mut stack, &text),
            },
            Event::Code(code) => push(&mut stack, Token::Codespan(code.to_string())),
            Event::InlineMath(math) | Event::DisplayMath(math) => push_text(&mut stack, &math),
            Event::Html(html) => match stack.last_mut().map(|open| &mut open.frame) {
                Some(Frame::Html(raw)) => raw.push_str(&html),
                _ => push(
                    &mut stack,
                    Token::Html {
                        raw: html.trim_end().to_string(),
                        inline: false,
                    },
                ),
            },
            Event::InlineHtml(html) => push(
                &mut stack,
                Token::Html {
                    raw: html.to_string(),
                    inline: true,
                },
            ),
            Event::SoftBreak => push_text(&mut stack, "\n"),
            Event::HardBreak => push(&mut stack, Token::HardBreak),
            Event::Rule => {
                let raw = src[range.clone()].trim().to_string();
                push(&mut stack, Token::Rule { raw });
                if stack.len() == 1 {
                    last_top_end = Some(range.end);
                }
            }
            Event::TaskListMarker(checked) => push(&mut stack, Token::Task(checked)),
            Event::FootnoteReference(label) => push_text(&mut stack, &format!("[^{label}]")),
        }
    }

    while stack.len() > 1 {
        close(&mut stack);
    }
    stack.pop().map(|root| root.children).unwrap_or_default()
}

fn heading_level(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

/// Whether the source between two top-level blocks holds an empty line.
fn has_blank_line(src: &str, prev_end: usize, next_start: usize) -> bool {
    if next_start <= prev_end {
        return false;
    }
    let gap = &src[prev_end..next_start];
    let carried = usize::from(src[..prev_end].ends_with('\n'));
    gap.matches('\n').count() + carried >= 2
}

fn push(stack: &mut [Open], token: Token) {
    if let Some(open) = stack.last_mut() {
        open.children.push(token);
    }
}

fn push_text(stack: &mut [Open], text: &str) {
    let Some(open) = stack.last_mut() else {
        return;
    };
    if let Some(Token::Text(prev)) = open.children.last_mut() {
        prev.push_str(text);
    } else {
        open.children.push(Token::Text(text.to_string()));
    }
}

/// Pop the innermost frame and attach its token to the parent.
fn close(stack: &mut Vec<Open>) {
    let Some(Open { frame, children }) = stack.pop() else {
        return;
    };
    let token = match frame {
        Frame::Root => {
            stack.push(Open {
                frame: Frame::Root,
                children,
            });
            return;
        }
        Frame::Paragraph => Token::Paragraph(children),
        Frame::Heading(level) => Token::Heading { level, children },
        Frame::Blockquote => Token::Blockquote(children),
        Frame::Code { language, mut code } => {
            if code.ends_with('\n') {
                code.pop();
            }
            Token::Code { language, code }
        }
        Frame::Html(raw) => Token::Html {
            raw: raw.trim_end().to_string(),
            inline: false,
        },
        Frame::List { ordered, start } => Token::List {
            ordered,
            start,
            items: children,
        },
        Frame::Item => Token::ListItem(children),
        Frame::Table(align) => Token::Table {
            align,
            rows: children,
        },
        Frame::TableRow => Token::TableRow(children),
        Frame::TableCell => Token::TableCell(children),
        Frame::Strong => Token::Strong(children),
        Frame::Emphasis => Token::Emphasis(children),
        Frame::Strikethrough => Token::Strikethrough(children),
        Frame::Link { url, title } => Token::Link {
            url,
            title,
            children,
        },
        Frame::Image { url, title } => Token::Image {
            url,
            title,
            children,
        },
        Frame::Transparent => {
            for child in children {
                match child {
                    Token::Text(text) => push_text(stack, &text),
                    other => push(stack, other),
                }
            }
            return;
        }
    };
    push(stack, token);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn text(s: &str) -> Token {
        Token::Text(s.to_string())
    }

    #[test]
    fn merges_soft_breaks_into_text() {
        let tokens = tokenize("one\ntwo");
        assert_eq!(tokens, vec![Token::Paragraph(vec![text("one\ntwo")])]);
    }

    #[test]
    fn marks_blank_lines_between_top_level_blocks() {
        let tokens = tokenize("# Title\n\nBody\n---\n");
        assert_eq!(
            tokens,
            vec![
                Token::Heading {
                    level: 1,
                    children: vec![text("Title")]
                },
                Token::Space,
                // `Body\n---` is a setext heading
                Token::Heading {
                    level: 2,
                    children: vec![text("Body")]
                },
            ]
        );
    }

    #[test]
    fn no_space_without_blank_line() {
        let tokens = tokenize("# Title\nBody");
        assert_eq!(tokens.len(), 2);
        assert!(!tokens.contains(&Token::Space));
    }

    #[test]
    fn task_markers_and_tight_items() {
        let tokens = tokenize("- [x] Done item");
        assert_eq!(
            tokens,
            vec![Token::List {
                ordered: false,
                start: 1,
                items: vec![Token::ListItem(vec![Token::Task(true), text("Done item")])],
            }]
        );
    }

    #[test]
    fn code_block_drops_final_newline() {
        let tokens = tokenize("```rust\nfn main() {}\n```");
        assert_eq!(
            tokens,
            vec![Token::Code {
                language: "rust".to_string(),
                code: "fn main() {}".to_string()
            }]
        );
    }

    #[test]
    fn table_head_becomes_first_row() {
        let tokens = tokenize("| a | b |\n| - | - |\n| 1 | 2 |");
        let Token::Table { rows, .. } = &tokens[0] else {
            panic!("expected a table, got {tokens:?}");
        };
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0],
            Token::TableRow(vec![
                Token::TableCell(vec![text("a")]),
                Token::TableCell(vec![text("b")]),
            ])
        );
    }

    #[test]
    fn rule_keeps_source_spelling() {
        assert_eq!(
            tokenize("***"),
            vec![Token::Rule {
                raw: "***".to_string()
            }]
        );
    }
}
