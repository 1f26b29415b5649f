//! Merged-cell normalization.
//!
//! Source tables encode merges as geometry hints: a cell spanning several
//! grid columns is written once with a span count, and a vertically merged
//! cell is written in every row but marked as a continuation below the first.
//! Walked naively, such tables come out ragged. This pass rebuilds each table
//! as a plain rectangular grid, either duplicating the merge origin's content
//! into every covered position or filling those positions with blank cells.

use crate::model::{Cell, Paragraph, Row, Table};

/// Rebuild `table` as a rectangular grid.
///
/// Column spans expand left to right; vertical continuations resolve top to
/// bottom, so a continuation picks up the already-expanded grid position
/// directly above even when the merge origin spans several columns. Rows
/// shorter than the widest row are padded with blank cells. Every output
/// cell reports span 1 and no continuation: the geometry has been applied.
pub(crate) fn normalize_table(table: &mut Table, duplicate: bool) {
    let mut grid: Vec<Vec<Cell>> = Vec::with_capacity(table.rows.len());
    for row in table.rows.drain(..) {
        let mut out: Vec<Cell> = Vec::new();
        for mut cell in row.cells {
            let span = cell.grid_span.max(1) as usize;
            let continuation = cell.merged_from_above;
            cell.grid_span = 1;
            cell.merged_from_above = false;
            if continuation && duplicate {
                // Continuations carry no content of their own worth keeping;
                // every covered position continues the column above. With no
                // row above the cell acts as an ordinary spanning cell.
                for _ in 0..span {
                    let above = grid.last().and_then(|cells| cells.get(out.len()));
                    let filled = above.cloned().unwrap_or_else(|| cell.clone());
                    out.push(filled);
                }
                continue;
            }
            let fills: Vec<Cell> = (1..span)
                .map(|_| if duplicate { cell.clone() } else { blank_cell() })
                .collect();
            out.push(cell);
            out.extend(fills);
        }
        grid.push(out);
    }
    let width = grid.iter().map(Vec::len).max().unwrap_or(0);
    for cells in &mut grid {
        while cells.len() < width {
            cells.push(blank_cell());
        }
    }
    table.rows = grid.into_iter().map(Row::new).collect();
}

/// A blank filler cell: one empty paragraph, so every grid position still
/// holds something addressable four levels deep.
fn blank_cell() -> Cell {
    Cell::with_paragraphs(vec![Paragraph::new()])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn continuation(span: u32) -> Cell {
        let mut cell = Cell::with_paragraphs(vec![Paragraph::new()]).spanning(span);
        cell.merged_from_above = true;
        cell
    }

    fn texts(table: &Table) -> Vec<Vec<Vec<String>>> {
        table.text()
    }

    #[test]
    fn test_column_span_blank_mode() {
        let mut table = Table::new();
        table.add_row(Row::new(vec![
            Cell::text("a"),
            Cell::text("bc").spanning(2),
            Cell::text("d"),
        ]));
        normalize_table(&mut table, false);
        assert_eq!(
            texts(&table),
            vec![vec![
                vec!["a".to_owned()],
                vec!["bc".to_owned()],
                vec![String::new()],
                vec!["d".to_owned()],
            ]]
        );
    }

    #[test]
    fn test_column_span_duplicate_mode() {
        let mut table = Table::new();
        table.add_row(Row::new(vec![
            Cell::text("a"),
            Cell::text("bc").spanning(2),
            Cell::text("d"),
        ]));
        normalize_table(&mut table, true);
        assert_eq!(
            texts(&table),
            vec![vec![
                vec!["a".to_owned()],
                vec!["bc".to_owned()],
                vec!["bc".to_owned()],
                vec!["d".to_owned()],
            ]]
        );
    }

    #[test]
    fn test_vertical_merge_duplicates_downward() {
        let mut table = Table::new();
        table.add_row(Row::new(vec![Cell::text("head"), Cell::text("r0")]));
        table.add_row(Row::new(vec![continuation(1), Cell::text("r1")]));
        table.add_row(Row::new(vec![continuation(1), Cell::text("r2")]));
        normalize_table(&mut table, true);
        let grid = texts(&table);
        assert_eq!(grid[1][0], vec!["head".to_owned()]);
        assert_eq!(grid[2][0], vec!["head".to_owned()]);
        assert_eq!(grid[2][1], vec!["r2".to_owned()]);
    }

    #[test]
    fn test_vertical_merge_blank_mode_leaves_empties() {
        let mut table = Table::new();
        table.add_row(Row::new(vec![Cell::text("head")]));
        table.add_row(Row::new(vec![continuation(1)]));
        normalize_table(&mut table, false);
        assert_eq!(
            texts(&table),
            vec![
                vec![vec!["head".to_owned()]],
                vec![vec![String::new()]],
            ]
        );
    }

    #[test]
    fn test_block_merge_fills_both_directions() {
        // one origin spanning three columns, continued one row down
        let mut table = Table::new();
        table.add_row(Row::new(vec![
            Cell::text("left"),
            Cell::text("block").spanning(3),
        ]));
        table.add_row(Row::new(vec![Cell::text("left2"), continuation(3)]));
        normalize_table(&mut table, true);
        let grid = texts(&table);
        for row in &grid {
            assert_eq!(row.len(), 4);
        }
        for col in 1..4 {
            assert_eq!(grid[0][col], vec!["block".to_owned()]);
            assert_eq!(grid[1][col], vec!["block".to_owned()]);
        }
    }

    #[test]
    fn test_short_rows_padded_to_grid_width() {
        let mut table = Table::new();
        table.add_row(Row::new(vec![Cell::text("a"), Cell::text("b")]));
        table.add_row(Row::new(vec![Cell::text("c")]));
        normalize_table(&mut table, false);
        assert!(table.is_rectangular());
        assert_eq!(texts(&table)[1], vec![vec!["c".to_owned()], vec![String::new()]]);
    }

    #[test]
    fn test_output_reports_no_merges() {
        let mut table = Table::new();
        table.add_row(Row::new(vec![Cell::text("wide").spanning(2)]));
        table.add_row(Row::new(vec![continuation(2)]));
        normalize_table(&mut table, true);
        assert!(!table.has_merged_cells());
        assert!(table.is_rectangular());
        assert_eq!(table.column_count(), 2);
    }

    #[test]
    fn test_plain_table_unchanged() {
        let mut table = Table::new();
        table.add_row(Row::new(vec![Cell::text("a"), Cell::text("b")]));
        table.add_row(Row::new(vec![Cell::text("c"), Cell::text("d")]));
        let before = texts(&table);
        normalize_table(&mut table, true);
        assert_eq!(texts(&table), before);
    }
}
