use serde_json::Value;

use crate::blocks::{Block, BlockBehavior, FieldSpec, FieldType, MarkdownContext};
use crate::markdown::escape::escape_inline;

use super::inline;

const MIN_WIDTH: usize = 3;

/// Pipe table.
///
/// Normally built from `tablerow` children, the first row being the header.
/// A table without rows falls back to `data.data`, a JSON array of objects
/// (or a string holding one) whose keys name the columns.
pub struct Table;

impl Table {
    pub const KIND: &'static str = "table";
}

impl BlockBehavior for Table {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn to_markdown(&self, block: &Block, ctx: &MarkdownContext) -> String {
        let rows: Vec<&Block> = block
            .children()
            .iter()
            .filter(|child| child.behavior_kind() == TableRow::KIND)
            .collect();
        if rows.is_empty() {
            return json_table(block);
        }

        let grid: Vec<Vec<String>> = rows
            .iter()
            .map(|row| {
                row.children()
                    .iter()
                    .map(|cell| cell_text(cell, ctx))
                    .collect()
            })
            .collect();
        let table_align = align_list(block.data().get("align"));
        let header_align: Vec<Option<String>> = rows[0]
            .children()
            .iter()
            .map(|cell| cell.text_field("align").map(str::to_string))
            .collect();
        let columns = grid.iter().map(Vec::len).max().unwrap_or(0);
        let align: Vec<Option<String>> = (0..columns)
            .map(|i| {
                header_align
                    .get(i)
                    .cloned()
                    .flatten()
                    .or_else(|| table_align.get(i).cloned().flatten())
            })
            .collect();
        render_grid(&grid, &align, true)
    }

    fn fields(&self) -> &'static [FieldSpec] {
        const FIELDS: &[FieldSpec] = &[
            FieldSpec::optional("caption", FieldType::String),
            FieldSpec::optional("showHeaders", FieldType::Boolean),
        ];
        FIELDS
    }
}

/// One row of a table. Standalone it renders as a single pipe row.
pub struct TableRow;

impl TableRow {
    pub const KIND: &'static str = "tablerow";
}

impl BlockBehavior for TableRow {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn to_markdown(&self, block: &Block, ctx: &MarkdownContext) -> String {
        let cells: Vec<String> = block
            .children()
            .iter()
            .map(|cell| cell_text(cell, ctx))
            .collect();
        format!("| {} |", cells.join(" | "))
    }
}

/// One cell. `data.align` is `left`, `center` or `right` when set.
pub struct TableCell;

impl TableCell {
    pub const KIND: &'static str = "tablecell";
}

impl BlockBehavior for TableCell {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn to_markdown(&self, block: &Block, ctx: &MarkdownContext) -> String {
        if block.children().is_empty() {
            escape_inline(block.text_field("text").unwrap_or_default())
        } else {
            inline(block.children(), ctx)
        }
    }

    fn fields(&self) -> &'static [FieldSpec] {
        const FIELDS: &[FieldSpec] = &[
            FieldSpec::optional("align", FieldType::String),
            FieldSpec::optional("header", FieldType::Boolean),
        ];
        FIELDS
    }
}

fn cell_text(cell: &Block, ctx: &MarkdownContext) -> String {
    cell.to_markdown(ctx).replace('\n', " ").trim().to_string()
}

fn align_list(value: Option<&Value>) -> Vec<Option<String>> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .map(|item| item.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

fn render_grid(grid: &[Vec<String>], align: &[Option<String>], header: bool) -> String {
    let columns = align.len().max(grid.iter().map(Vec::len).max().unwrap_or(0));
    let widths: Vec<usize> = (0..columns)
        .map(|i| {
            grid.iter()
                .filter_map(|row| row.get(i))
                .map(|cell| cell.chars().count())
                .max()
                .unwrap_or(0)
                .max(MIN_WIDTH)
        })
        .collect();

    let row_line = |row: &[String]| {
        let cells: Vec<String> = widths
            .iter()
            .enumerate()
            .map(|(i, width)| pad(row.get(i).map_or("", String::as_str), *width))
            .collect();
        format!("| {} |", cells.join(" | "))
    };

    let mut lines = Vec::with_capacity(grid.len() + 1);
    for (i, row) in grid.iter().enumerate() {
        lines.push(row_line(row));
        if i == 0 && header {
            let markers: Vec<String> = widths
                .iter()
                .enumerate()
                .map(|(i, width)| align_marker(align.get(i).and_then(Option::as_deref), *width))
                .collect();
            lines.push(format!("| {} |", markers.join(" | ")));
        }
    }
    lines.join("\n")
}

fn pad(text: &str, width: usize) -> String {
    let len = text.chars().count();
    format!("{text}{}", " ".repeat(width.saturating_sub(len)))
}

fn align_marker(align: Option<&str>, width: usize) -> String {
    match align {
        Some("left") => format!(":{}", "-".repeat(width - 1)),
        Some("right") => format!("{}:", "-".repeat(width - 1)),
        Some("center") => format!(":{}:", "-".repeat(width - 2)),
        _ => "-".repeat(width),
    }
}

fn json_table(block: &Block) -> String {
    let rows = match block.data().get("data") {
        Some(Value::String(raw)) => match serde_json::from_str::<Value>(raw) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("Table data is not valid JSON: {e}");
                return String::new();
            }
        },
        Some(value) => value.clone(),
        None => return String::new(),
    };
    let Some(rows) = rows.as_array() else {
        return String::new();
    };
    let headers: Vec<String> = rows
        .first()
        .and_then(Value::as_object)
        .map(|first| first.keys().cloned().collect())
        .unwrap_or_default();
    if headers.is_empty() {
        return String::new();
    }

    let show_headers = block.data().get("showHeaders").and_then(Value::as_bool) != Some(false);
    let mut grid = Vec::with_capacity(rows.len() + 1);
    if show_headers {
        grid.push(headers.iter().map(|h| escape_inline(h)).collect());
    }
    for row in rows {
        grid.push(
            headers
                .iter()
                .map(|h| match row.get(h) {
                    None | Some(Value::Null) => String::new(),
                    Some(Value::String(s)) => escape_inline(s),
                    Some(other) => escape_inline(&other.to_string()),
                })
                .collect(),
        );
    }
    let align = align_list(block.data().get("align"));
    render_grid(&grid, &align, show_headers)
}

#[cfg(test)]
mod tests {
    use crate::blocks::{BlockRegistry, MarkdownContext};
    use crate::model::BlockRecord;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn cell(text: &str) -> BlockRecord {
        BlockRecord::new("tablecell").with_children(vec![BlockRecord::new("text").with("text", text)])
    }

    fn render(record: BlockRecord) -> String {
        BlockRegistry::with_builtin()
            .create(record)
            .to_markdown(&MarkdownContext::new())
    }

    #[test]
    fn pads_columns_and_marks_alignment() {
        // Given a header row with a right-aligned second column
        let header = BlockRecord::new("tablerow").with_children(vec![
            cell("Name").with("header", true),
            cell("Qty").with("header", true).with("align", "right"),
        ]);
        let row = BlockRecord::new("tablerow").with_children(vec![cell("Flour"), cell("500")]);
        let table = BlockRecord::new("table").with_children(vec![header, row]);

        // When / Then
        assert_eq!(
            render(table),
            "| Name  | Qty |\n| ----- | --: |\n| Flour | 500 |"
        );
    }

    #[test]
    fn renders_json_data_when_there_are_no_rows() {
        let table = BlockRecord::new("table").with(
            "data",
            json!([{"a": "x", "b": 1}, {"a": "longer", "b": null}]).to_string(),
        );

        assert_eq!(
            render(table),
            "| a      | b   |\n| ------ | --- |\n| x      | 1   |\n| longer |     |"
        );
    }

    #[test]
    fn json_data_without_headers() {
        let table = BlockRecord::new("table")
            .with("data", json!([{"a": "x"}]))
            .with("showHeaders", false);

        assert_eq!(render(table), "| x   |");
    }

    #[test]
    fn invalid_json_renders_nothing() {
        let table = BlockRecord::new("table").with("data", "not json");
        assert_eq!(render(table), "");
    }
}
