//! Table types.
//!
//! Everything extracted lives in a table, even plain body text: paragraphs
//! outside any source table are wrapped in single-cell pseudo-tables, so the
//! output is always exactly table -> row -> cell -> paragraph deep.

use serde::{Deserialize, Serialize};

use super::Paragraph;

/// A table: an ordered sequence of rows.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Table {
    /// Rows in the table
    pub rows: Vec<Row>,
}

impl Table {
    /// Create a new empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a row to the table.
    pub fn add_row(&mut self, row: Row) {
        self.rows.push(row);
    }

    /// Get the number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Get the number of columns (widest row).
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(|r| r.cells.len()).max().unwrap_or(0)
    }

    /// Check if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Check if every row has the same cell count. Normalized tables
    /// always do.
    pub fn is_rectangular(&self) -> bool {
        let mut widths = self.rows.iter().map(|r| r.cells.len());
        match widths.next() {
            Some(first) => widths.all(|w| w == first),
            None => true,
        }
    }

    /// Check if any cell declares a span or continues a vertical merge.
    pub fn has_merged_cells(&self) -> bool {
        self.rows
            .iter()
            .flat_map(|r| &r.cells)
            .any(|c| c.grid_span > 1 || c.merged_from_above)
    }

    /// Paragraph texts as nested rows -> cells -> paragraphs.
    pub fn text(&self) -> Vec<Vec<Vec<String>>> {
        self.rows.iter().map(Row::text).collect()
    }

    /// Run texts as nested rows -> cells -> paragraphs -> runs.
    pub fn run_strings(&self) -> Vec<Vec<Vec<Vec<String>>>> {
        self.rows.iter().map(Row::run_strings).collect()
    }

    /// Plain text of the whole table, one line per row, cells tab-joined.
    pub fn plain_text(&self) -> String {
        self.rows
            .iter()
            .map(|row| row.plain_text())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A table row.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Row {
    /// Cells in the row
    pub cells: Vec<Cell>,
}

impl Row {
    /// Create a new row with cells.
    pub fn new(cells: Vec<Cell>) -> Self {
        Self { cells }
    }

    /// Create a row from text values, one single-paragraph cell each.
    pub fn from_strings<S: Into<String>>(values: impl IntoIterator<Item = S>) -> Self {
        Self::new(values.into_iter().map(Cell::text).collect())
    }

    /// Width in grid columns, honoring declared spans.
    pub fn grid_width(&self) -> usize {
        self.cells.iter().map(|c| c.grid_span.max(1) as usize).sum()
    }

    /// Paragraph texts as nested cells -> paragraphs.
    pub fn text(&self) -> Vec<Vec<String>> {
        self.cells.iter().map(Cell::text_strings).collect()
    }

    /// Run texts as nested cells -> paragraphs -> runs.
    pub fn run_strings(&self) -> Vec<Vec<Vec<String>>> {
        self.cells.iter().map(Cell::run_strings).collect()
    }

    /// Plain text of the row, cells tab-joined.
    pub fn plain_text(&self) -> String {
        self.cells
            .iter()
            .map(|c| c.plain_text())
            .collect::<Vec<_>>()
            .join("\t")
    }
}

/// A table cell: an ordered sequence of paragraphs, never nested tables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cell {
    /// Cell content (paragraphs)
    pub paragraphs: Vec<Paragraph>,

    /// Declared column span; 1 when not merged
    pub grid_span: u32,

    /// True when this cell continues a vertical merge begun above
    pub merged_from_above: bool,
}

impl Cell {
    /// Create an empty cell.
    pub fn empty() -> Self {
        Self {
            paragraphs: Vec::new(),
            grid_span: 1,
            merged_from_above: false,
        }
    }

    /// Create a cell with a single plain-text paragraph.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            paragraphs: vec![Paragraph::with_text(text)],
            ..Self::empty()
        }
    }

    /// Create a cell with multiple paragraphs.
    pub fn with_paragraphs(paragraphs: Vec<Paragraph>) -> Self {
        Self {
            paragraphs,
            ..Self::empty()
        }
    }

    /// Set the column span and return self.
    pub fn spanning(mut self, span: u32) -> Self {
        self.grid_span = span;
        self
    }

    /// Paragraph texts of this cell.
    pub fn text_strings(&self) -> Vec<String> {
        self.paragraphs.iter().map(Paragraph::text).collect()
    }

    /// Run texts as nested paragraphs -> runs.
    pub fn run_strings(&self) -> Vec<Vec<String>> {
        self.paragraphs.iter().map(Paragraph::run_strings).collect()
    }

    /// Plain text of the cell, paragraphs space-joined.
    pub fn plain_text(&self) -> String {
        self.paragraphs
            .iter()
            .map(Paragraph::text)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Check if the cell carries no text.
    pub fn is_empty(&self) -> bool {
        self.paragraphs.iter().all(Paragraph::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_new() {
        let table = Table::new();
        assert!(table.is_empty());
        assert_eq!(table.row_count(), 0);
        assert_eq!(table.column_count(), 0);
        assert!(table.is_rectangular());
    }

    #[test]
    fn test_table_with_data() {
        let mut table = Table::new();
        table.add_row(Row::from_strings(["Name", "Age"]));
        table.add_row(Row::from_strings(["Alice", "30"]));

        assert_eq!(table.row_count(), 2);
        assert_eq!(table.column_count(), 2);
        assert!(table.is_rectangular());
        assert_eq!(table.text()[1][0], vec!["Alice"]);
        assert_eq!(table.plain_text(), "Name\tAge\nAlice\t30");
    }

    #[test]
    fn test_ragged_table_is_not_rectangular() {
        let mut table = Table::new();
        table.add_row(Row::from_strings(["a", "b"]));
        table.add_row(Row::from_strings(["c"]));

        assert!(!table.is_rectangular());
        assert_eq!(table.column_count(), 2);
    }

    #[test]
    fn test_merged_cells() {
        let mut table = Table::new();
        table.add_row(Row::new(vec![Cell::text("Merged").spanning(2)]));

        assert!(table.has_merged_cells());
        assert_eq!(table.rows[0].grid_width(), 2);
    }

    #[test]
    fn test_cell_text() {
        let cell = Cell::text("Hello");
        assert_eq!(cell.plain_text(), "Hello");
        assert!(!cell.is_empty());
        assert!(Cell::empty().is_empty());
    }
}
