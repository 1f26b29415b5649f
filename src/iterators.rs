//! Traversal helpers over extracted content.
//!
//! Extracted parts nest four deep: tables hold rows hold cells hold
//! paragraphs, with runs one level further down. These functions walk any
//! `&[Table]` slice at a fixed depth and hand back each item, with or
//! without its index tuple, so filtering and rewriting recipes can address
//! content without nested loops.
//!
//! Index tuples line up with plain indexing: `enum_cells` yielding
//! `((1, 0, 2), cell)` means `&tables[1].rows[0].cells[2]`.

use crate::model::{Cell, Paragraph, Row, Run, Table};

/// Enumerate tables with their indices.
pub fn enum_tables(tables: &[Table]) -> impl Iterator<Item = (usize, &Table)> {
    tables.iter().enumerate()
}

/// Enumerate rows as `((table, row), value)`.
pub fn enum_rows(tables: &[Table]) -> impl Iterator<Item = ((usize, usize), &Row)> {
    tables.iter().enumerate().flat_map(|(t, table)| {
        table
            .rows
            .iter()
            .enumerate()
            .map(move |(r, row)| ((t, r), row))
    })
}

/// Enumerate cells as `((table, row, cell), value)`.
pub fn enum_cells(tables: &[Table]) -> impl Iterator<Item = ((usize, usize, usize), &Cell)> {
    enum_rows(tables).flat_map(|((t, r), row)| {
        row.cells
            .iter()
            .enumerate()
            .map(move |(c, cell)| ((t, r, c), cell))
    })
}

/// Enumerate paragraphs as `((table, row, cell, paragraph), value)`.
pub fn enum_paragraphs(
    tables: &[Table],
) -> impl Iterator<Item = ((usize, usize, usize, usize), &Paragraph)> {
    enum_cells(tables).flat_map(|((t, r, c), cell)| {
        cell.paragraphs
            .iter()
            .enumerate()
            .map(move |(p, par)| ((t, r, c, p), par))
    })
}

/// Enumerate runs as `((table, row, cell, paragraph, run), value)`.
pub fn enum_runs(
    tables: &[Table],
) -> impl Iterator<Item = ((usize, usize, usize, usize, usize), &Run)> {
    enum_paragraphs(tables).flat_map(|((t, r, c, p), par)| {
        par.runs
            .iter()
            .enumerate()
            .map(move |(n, run)| ((t, r, c, p, n), run))
    })
}

/// Iterate rows of every table.
pub fn iter_rows(tables: &[Table]) -> impl Iterator<Item = &Row> {
    tables.iter().flat_map(|t| t.rows.iter())
}

/// Iterate cells of every row of every table.
pub fn iter_cells(tables: &[Table]) -> impl Iterator<Item = &Cell> {
    iter_rows(tables).flat_map(|r| r.cells.iter())
}

/// Iterate every paragraph in reading order.
pub fn iter_paragraphs(tables: &[Table]) -> impl Iterator<Item = &Paragraph> {
    iter_cells(tables).flat_map(|c| c.paragraphs.iter())
}

/// Iterate every run in reading order.
pub fn iter_runs(tables: &[Table]) -> impl Iterator<Item = &Run> {
    iter_paragraphs(tables).flat_map(|p| p.runs.iter())
}

/// All paragraph text in the slice, paragraphs separated by blank lines.
pub fn text(tables: &[Table]) -> String {
    iter_paragraphs(tables)
        .map(Paragraph::text)
        .collect::<Vec<_>>()
        .join("\n\n")
}
