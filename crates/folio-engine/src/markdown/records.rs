use pulldown_cmark::Alignment;
use serde_json::Value;

use super::tokens::Token;
use crate::model::BlockRecord;

/// Build one record per token.
pub fn records(tokens: Vec<Token>) -> Vec<BlockRecord> {
    tokens.into_iter().map(record).collect()
}

/// Map a single token to the record it constructs.
pub fn record(token: Token) -> BlockRecord {
    match token {
        Token::Heading { level, children } => BlockRecord::new("heading")
            .with("level", level)
            .with_children(records(children)),
        Token::Paragraph(children) => BlockRecord::new("paragraph").with_children(records(children)),
        Token::Text(text) => BlockRecord::new("text").with("text", text),
        Token::Codespan(text) => BlockRecord::new("codespan").with("text", text),
        Token::Code { language, code } => BlockRecord::new("code")
            .with("language", language)
            .with("code", code),
        Token::Blockquote(children) => BlockRecord::new("blockquote").with_children(records(children)),
        Token::List {
            ordered,
            start,
            items,
        } => {
            let mut list = BlockRecord::new("list").with("ordered", ordered);
            if ordered {
                list = list.with("start", start);
            }
            list.with_children(records(items))
        }
        Token::ListItem(children) => list_item(children),
        Token::Task(checked) => checkbox(checked),
        Token::Table { align, rows } => table(align, rows),
        Token::TableRow(cells) => BlockRecord::new("tablerow").with_children(records(cells)),
        Token::TableCell(children) => BlockRecord::new("tablecell").with_children(records(children)),
        Token::Strong(children) => styled("strong", children),
        Token::Emphasis(children) => styled("em", children),
        Token::Strikethrough(children) => styled("del", children),
        Token::Link {
            url,
            title,
            children,
        } => {
            let mut link = BlockRecord::new("link")
                .with("url", url)
                .with("text", plain_text(&children));
            if !title.is_empty() {
                link = link.with("title", title);
            }
            link
        }
        Token::Image {
            url,
            title,
            children,
        } => {
            let mut image = BlockRecord::new("image")
                .with("url", url)
                .with("alt", plain_text(&children));
            if !title.is_empty() {
                image = image.with("caption", title);
            }
            image
        }
        Token::Rule { raw } => BlockRecord::new("hr").with("raw", raw),
        Token::Html { raw, inline } => {
            let html = BlockRecord::new("html").with("raw", raw);
            if inline { html.with("inline", true) } else { html }
        }
        Token::HardBreak => BlockRecord::new("br"),
        Token::Space => BlockRecord::new("separator"),
    }
}

fn checkbox(checked: bool) -> BlockRecord {
    BlockRecord::new("checkbox").with("checked", checked)
}

/// A list item, with its task marker hoisted to a leading checkbox child and
/// a lone paragraph flattened into the item.
fn list_item(mut children: Vec<Token>) -> BlockRecord {
    let mut task = None;
    if let Some(Token::Task(checked)) = children.first() {
        task = Some(*checked);
        children.remove(0);
    } else if let Some(Token::Paragraph(inner)) = children.first_mut()
        && let Some(Token::Task(checked)) = inner.first()
    {
        task = Some(*checked);
        inner.remove(0);
    }

    if children.len() == 1 && matches!(children[0], Token::Paragraph(_)) {
        if let Some(Token::Paragraph(inner)) = children.pop() {
            children = inner;
        }
    }

    // The marker's trailing space is part of the checkbox's markdown.
    if task.is_some()
        && let Some(Token::Text(text)) = children.first_mut()
    {
        let trimmed = text.trim_start().to_string();
        *text = trimmed;
    }

    let mut item_children = Vec::with_capacity(children.len() + 1);
    if let Some(checked) = task {
        item_children.push(checkbox(checked));
    }
    item_children.extend(records(children));
    BlockRecord::new("item").with_children(item_children)
}

/// strong/em/del become styled text. A single plain run is stored directly,
/// anything richer is kept as children.
fn styled(style: &str, mut children: Vec<Token>) -> BlockRecord {
    if children.len() == 1 && matches!(children[0], Token::Text(_)) {
        if let Some(Token::Text(text)) = children.pop() {
            return BlockRecord::new("text").with("text", text).with("style", style);
        }
    }
    BlockRecord::new("text")
        .with("text", "")
        .with("style", style)
        .with_children(records(children))
}

fn table(align: Vec<Alignment>, rows: Vec<Token>) -> BlockRecord {
    let align_names: Vec<Value> = align.iter().map(|a| align_name(*a)).collect();
    let rows = rows
        .into_iter()
        .enumerate()
        .map(|(row_index, row)| {
            let Token::TableRow(cells) = row else {
                return record(row);
            };
            let cells = cells
                .into_iter()
                .enumerate()
                .map(|(col, cell)| {
                    let mut cell = record(cell);
                    if let Some(Value::String(name)) = align_names.get(col) {
                        cell = cell.with("align", name.as_str());
                    }
                    if row_index == 0 {
                        cell = cell.with("header", true);
                    }
                    cell
                })
                .collect();
            BlockRecord::new("tablerow").with_children(cells)
        })
        .collect();
    BlockRecord::new("table")
        .with("align", align_names)
        .with_children(rows)
}

fn align_name(align: Alignment) -> Value {
    match align {
        Alignment::None => Value::Null,
        Alignment::Left => Value::from("left"),
        Alignment::Center => Value::from("center"),
        Alignment::Right => Value::from("right"),
    }
}

/// Concatenated text content, dropping markup.
fn plain_text(tokens: &[Token]) -> String {
    let mut out = String::new();
    for token in tokens {
        match token {
            Token::Text(text) | Token::Codespan(text) => out.push_str(text),
            Token::Html { raw, .. } => out.push_str(raw),
            Token::HardBreak => out.push(' '),
            Token::Strong(children)
            | Token::Emphasis(children)
            | Token::Strikethrough(children)
            | Token::Paragraph(children) => out.push_str(&plain_text(children)),
            Token::Link { children, .. } | Token::Image { children, .. } => {
                out.push_str(&plain_text(children))
            }
            _ => {}
        }
    }
    out
}
