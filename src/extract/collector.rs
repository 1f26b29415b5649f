//! Fixed-depth assembly of extracted content.
//!
//! Output always has the same shape: tables hold rows hold cells hold
//! paragraphs hold runs, no matter where text sat in the source markup. The
//! collector keeps a caret at the current insertion depth. Structural
//! elements move the caret as the walk opens and closes them; raising the
//! caret seals the deepest open branch, dropping it opens a fresh one, so
//! body text outside any table still lands inside a one-cell wrapper and two
//! sibling tables can never grow together.
//!
//! Paragraph state is tracked beside the caret rather than beneath it: runs
//! that arrive before any paragraph opens (a footnote lead-in, for instance)
//! wait as orphans and are adopted by the next paragraph.

use std::collections::HashMap;

use crate::extract::lists::ListItem;
use crate::extract::styles::{close_markers, decorate_runs, open_markers};
use crate::model::{Cell, Paragraph, Row, Run, Table};
use crate::parser::xml::NodeId;

/// A paragraph under construction, with the style markers to close around it.
struct OpenPar {
    par: Paragraph,
    signature: Vec<String>,
}

/// Everything one part walk produced.
pub(crate) struct CollectedPart {
    pub tables: Vec<Table>,
    /// Comment range id -> (first run ordinal, one-past-last run ordinal),
    /// counting non-empty runs across the whole part.
    pub comment_ranges: HashMap<String, (usize, usize)>,
}

pub(crate) struct DepthCollector {
    html: bool,
    inject_styles: bool,
    completed: Vec<Table>,
    open_table: Option<Table>,
    open_row: Option<Row>,
    open_cell: Option<Cell>,
    open_par: Option<OpenPar>,
    orphan_runs: Vec<Run>,
    comment_ranges: HashMap<String, (usize, usize)>,
}

impl DepthCollector {
    pub fn new(html: bool, inject_styles: bool) -> Self {
        Self {
            html,
            inject_styles,
            completed: Vec::new(),
            open_table: None,
            open_row: None,
            open_cell: None,
            open_par: None,
            orphan_runs: Vec::new(),
            comment_ranges: HashMap::new(),
        }
    }

    /// Caret depth: 1 with nothing open, up to 4 with a cell open.
    fn depth(&self) -> usize {
        1 + usize::from(self.open_table.is_some())
            + usize::from(self.open_row.is_some())
            + usize::from(self.open_cell.is_some())
    }

    /// Align the caret with an element's depth. `None` leaves it alone.
    ///
    /// Raising seals branches; a later drop opens new ones. An element at the
    /// caret's own depth therefore closes its predecessor: a second table at
    /// depth 1 seals the first table before its rows open the next one.
    pub fn set_caret(&mut self, target: Option<usize>) {
        let Some(target) = target else {
            return;
        };
        let target = target.clamp(1, 4);
        while self.depth() > target {
            self.raise_caret();
        }
        while self.depth() < target {
            self.drop_caret();
        }
    }

    fn drop_caret(&mut self) {
        if self.open_table.is_none() {
            self.open_table = Some(Table::new());
        } else if self.open_row.is_none() {
            self.open_row = Some(Row::new(Vec::new()));
        } else if self.open_cell.is_none() {
            self.open_cell = Some(Cell::empty());
        }
    }

    fn raise_caret(&mut self) {
        if let Some(cell) = self.open_cell.take() {
            if let Some(row) = &mut self.open_row {
                row.cells.push(cell);
            }
            return;
        }
        if let Some(row) = self.open_row.take() {
            if let Some(table) = &mut self.open_table {
                table.add_row(row);
            }
            return;
        }
        if let Some(table) = self.open_table.take() {
            self.completed.push(table);
        }
    }

    /// Open a paragraph, adopting any runs waiting for one.
    pub fn commence_paragraph(
        &mut self,
        style_name: Option<String>,
        signature: Vec<String>,
        source: Option<NodeId>,
        list: Option<ListItem>,
    ) {
        if self.open_par.is_some() {
            self.conclude_paragraph();
        }
        let mut par = Paragraph::new();
        if self.inject_styles {
            par.runs.push(Run::plain(
                style_name.clone().unwrap_or_else(|| "None".to_owned()),
            ));
        }
        par.runs.append(&mut self.orphan_runs);
        // markers render only in HTML mode; the signature is kept either way
        if self.html {
            par.runs.push(Run::plain(open_markers(&signature)));
        }
        if let Some(item) = list {
            par.list_position = Some(item.position);
            par.runs.push(Run::plain(item.prefix));
        }
        par.style = style_name;
        par.source = source;
        self.open_par = Some(OpenPar { par, signature });
    }

    /// Seal the open paragraph and place it at depth 4.
    pub fn conclude_paragraph(&mut self) {
        let Some(mut open) = self.open_par.take() else {
            return;
        };
        if self.html {
            open.par.runs.push(Run::plain(close_markers(&open.signature)));
            decorate_runs(&mut open.par.runs);
        }
        open.par.runs.retain(|run| !run.text.is_empty());
        self.set_caret(Some(4));
        if let Some(cell) = &mut self.open_cell {
            cell.paragraphs.push(open.par);
        }
    }

    /// Open a run carrying a formatting signature.
    pub fn commence_run(&mut self, signature: Vec<String>) {
        self.open_runs().push(Run::new(signature, ""));
    }

    /// Close the current run by opening an unstyled successor.
    pub fn conclude_run(&mut self) {
        self.open_runs().push(Run::default());
    }

    /// Append document text to the open run, escaping it in HTML mode.
    pub fn add_text(&mut self, text: &str) {
        if self.html {
            let escaped = crate::extract::styles::escape(text);
            self.open_run().text.push_str(&escaped);
        } else {
            self.open_run().text.push_str(text);
        }
    }

    /// Append generated markup to the open run. Never escaped.
    pub fn add_markup(&mut self, markup: &str) {
        self.open_run().text.push_str(markup);
    }

    /// Insert text as a run of its own, then restore the interrupted style.
    ///
    /// Tabs, link renderings, and placeholders land mid-run without taking
    /// on the surrounding run's formatting.
    pub fn insert_as_new_run(&mut self, text: &str) {
        let carried = self.open_run().style.clone();
        let runs = self.open_runs();
        runs.push(Run::plain(text));
        runs.push(Run::new(carried, ""));
    }

    /// Record grid geometry on the cell being closed.
    pub fn annotate_open_cell(&mut self, grid_span: u32, merged_from_above: bool) {
        if let Some(cell) = &mut self.open_cell {
            cell.grid_span = grid_span.max(1);
            cell.merged_from_above = merged_from_above;
        }
    }

    pub fn start_comment_range(&mut self, id: &str) {
        let at = self.runs_so_far();
        self.comment_ranges.insert(id.to_owned(), (at, at));
    }

    /// Close a comment range. An end with no matching start is dropped; the
    /// output stage reconciles ranges against the comments part anyway.
    pub fn end_comment_range(&mut self, id: &str) {
        let at = self.runs_so_far();
        if let Some(range) = self.comment_ranges.get_mut(id) {
            range.1 = at;
        }
    }

    /// Ordinal of the next non-empty run. Empty runs are invisible in output,
    /// so ranges count only runs that will exist after paragraphs are sealed.
    fn runs_so_far(&self) -> usize {
        let mut count: usize = self.completed.iter().map(table_runs).sum();
        if let Some(table) = &self.open_table {
            count += table_runs(table);
        }
        if let Some(row) = &self.open_row {
            count += row_runs(row);
        }
        if let Some(cell) = &self.open_cell {
            count += cell_runs(cell);
        }
        if let Some(open) = &self.open_par {
            count += par_runs(&open.par);
        }
        count + self.orphan_runs.iter().filter(|run| !run.text.is_empty()).count()
    }

    fn open_runs(&mut self) -> &mut Vec<Run> {
        match &mut self.open_par {
            Some(open) => &mut open.par.runs,
            None => &mut self.orphan_runs,
        }
    }

    fn open_run(&mut self) -> &mut Run {
        let runs = self.open_runs();
        if runs.is_empty() {
            runs.push(Run::default());
        }
        let last = runs.len() - 1;
        &mut runs[last]
    }

    /// Wrap any leftover orphan runs in a paragraph, seal everything that is
    /// still open, and hand over the collected part.
    pub fn finish(mut self) -> CollectedPart {
        if !self.orphan_runs.is_empty() {
            self.commence_paragraph(None, Vec::new(), None, None);
        }
        if self.open_par.is_some() {
            self.conclude_paragraph();
        }
        self.set_caret(Some(1));
        CollectedPart {
            tables: self.completed,
            comment_ranges: self.comment_ranges,
        }
    }
}

fn table_runs(table: &Table) -> usize {
    table.rows.iter().map(row_runs).sum()
}

fn row_runs(row: &Row) -> usize {
    row.cells.iter().map(cell_runs).sum()
}

fn cell_runs(cell: &Cell) -> usize {
    cell.paragraphs.iter().map(par_runs).sum()
}

fn par_runs(par: &Paragraph) -> usize {
    par.runs.iter().filter(|run| !run.text.is_empty()).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain_paragraph(collector: &mut DepthCollector, text: &str) {
        collector.commence_paragraph(None, Vec::new(), None, None);
        collector.commence_run(Vec::new());
        collector.add_text(text);
        collector.conclude_run();
        collector.conclude_paragraph();
    }

    #[test]
    fn test_loose_paragraph_gets_a_wrapper_table() {
        let mut collector = DepthCollector::new(false, false);
        plain_paragraph(&mut collector, "hello");
        let part = collector.finish();
        assert_eq!(part.tables.len(), 1);
        assert_eq!(part.tables[0].rows[0].cells[0].paragraphs[0].text(), "hello");
    }

    #[test]
    fn test_caret_realignment_separates_tables() {
        let mut collector = DepthCollector::new(false, false);
        // first table
        collector.set_caret(Some(1));
        collector.set_caret(Some(2));
        collector.set_caret(Some(3));
        collector.set_caret(Some(4));
        plain_paragraph(&mut collector, "one");
        // second table element realigns to depth 1, sealing the first
        collector.set_caret(Some(1));
        collector.set_caret(Some(2));
        collector.set_caret(Some(3));
        collector.set_caret(Some(4));
        plain_paragraph(&mut collector, "two");
        let part = collector.finish();
        assert_eq!(part.tables.len(), 2);
        assert_eq!(part.tables[0].rows[0].cells[0].paragraphs[0].text(), "one");
        assert_eq!(part.tables[1].rows[0].cells[0].paragraphs[0].text(), "two");
    }

    #[test]
    fn test_orphan_runs_adopted_by_next_paragraph() {
        let mut collector = DepthCollector::new(false, false);
        collector.insert_as_new_run("footnote1)\t");
        collector.commence_paragraph(None, Vec::new(), None, None);
        collector.commence_run(Vec::new());
        collector.add_text("the note text");
        collector.conclude_paragraph();
        let part = collector.finish();
        let par = &part.tables[0].rows[0].cells[0].paragraphs[0];
        assert_eq!(par.text(), "footnote1)\tthe note text");
    }

    #[test]
    fn test_trailing_orphans_wrapped_in_paragraph() {
        let mut collector = DepthCollector::new(false, false);
        collector.add_text("dangling");
        let part = collector.finish();
        assert_eq!(part.tables[0].rows[0].cells[0].paragraphs[0].text(), "dangling");
    }

    #[test]
    fn test_text_escaped_only_in_html_mode() {
        let mut collector = DepthCollector::new(true, false);
        collector.add_text("a < b");
        collector.add_markup("<latex>x</latex>");
        let part = collector.finish();
        let par = &part.tables[0].rows[0].cells[0].paragraphs[0];
        assert_eq!(par.text(), "a &lt; b<latex>x</latex>");

        let mut collector = DepthCollector::new(false, false);
        collector.add_text("a < b");
        let part = collector.finish();
        assert_eq!(part.tables[0].rows[0].cells[0].paragraphs[0].text(), "a < b");
    }

    #[test]
    fn test_insert_as_new_run_restores_style() {
        let mut collector = DepthCollector::new(true, false);
        collector.commence_paragraph(None, Vec::new(), None, None);
        collector.commence_run(vec!["b".to_owned()]);
        collector.add_text("left");
        collector.insert_as_new_run("\t");
        collector.add_text("right");
        collector.conclude_run();
        collector.conclude_paragraph();
        let part = collector.finish();
        let par = &part.tables[0].rows[0].cells[0].paragraphs[0];
        assert_eq!(par.text(), "<b>left</b>\t<b>right</b>");
    }

    #[test]
    fn test_paragraph_markers_wrap_heading() {
        let mut collector = DepthCollector::new(true, false);
        collector.commence_paragraph(
            Some("Heading1".to_owned()),
            vec!["h1".to_owned()],
            None,
            None,
        );
        collector.commence_run(Vec::new());
        collector.add_text("Title");
        collector.conclude_run();
        collector.conclude_paragraph();
        let part = collector.finish();
        let par = &part.tables[0].rows[0].cells[0].paragraphs[0];
        assert_eq!(par.text(), "<h1>Title</h1>");
        assert_eq!(par.style.as_deref(), Some("Heading1"));
    }

    #[test]
    fn test_markers_suppressed_outside_html_mode() {
        let mut collector = DepthCollector::new(false, false);
        collector.commence_paragraph(
            Some("Heading1".to_owned()),
            vec!["h1".to_owned()],
            None,
            None,
        );
        collector.commence_run(vec!["b".to_owned()]);
        collector.add_text("Title");
        collector.conclude_run();
        collector.conclude_paragraph();
        let part = collector.finish();
        let par = &part.tables[0].rows[0].cells[0].paragraphs[0];
        assert_eq!(par.text(), "Title");
        assert_eq!(par.runs[0].style, ["b"]);
    }

    #[test]
    fn test_style_descriptor_run_injected() {
        let mut collector = DepthCollector::new(false, true);
        collector.commence_paragraph(Some("Quote".to_owned()), Vec::new(), None, None);
        collector.commence_run(Vec::new());
        collector.add_text("said");
        collector.conclude_paragraph();
        plain_paragraph(&mut collector, "unstyled");
        let part = collector.finish();
        let cell = &part.tables[0].rows[0].cells[0];
        assert_eq!(cell.paragraphs[0].run_strings(), ["Quote", "said"]);
        assert_eq!(cell.paragraphs[1].run_strings(), ["None", "unstyled"]);
    }

    #[test]
    fn test_empty_runs_dropped_from_sealed_paragraphs() {
        let mut collector = DepthCollector::new(false, false);
        collector.commence_paragraph(None, Vec::new(), None, None);
        collector.commence_run(Vec::new());
        collector.conclude_run();
        collector.commence_run(Vec::new());
        collector.add_text("only");
        collector.conclude_run();
        collector.conclude_paragraph();
        let part = collector.finish();
        let par = &part.tables[0].rows[0].cells[0].paragraphs[0];
        assert_eq!(par.runs.len(), 1);
        assert_eq!(par.runs[0].text, "only");
    }

    #[test]
    fn test_comment_ranges_count_nonempty_runs() {
        let mut collector = DepthCollector::new(false, false);
        plain_paragraph(&mut collector, "zero");
        collector.commence_paragraph(None, Vec::new(), None, None);
        collector.start_comment_range("7");
        collector.commence_run(Vec::new());
        collector.add_text("one");
        collector.conclude_run();
        collector.commence_run(Vec::new());
        collector.add_text("two");
        collector.conclude_run();
        collector.end_comment_range("7");
        collector.conclude_paragraph();
        let part = collector.finish();
        assert_eq!(part.comment_ranges.get("7"), Some(&(1, 3)));
    }

    #[test]
    fn test_unmatched_comment_end_ignored() {
        let mut collector = DepthCollector::new(false, false);
        collector.end_comment_range("9");
        let part = collector.finish();
        assert!(part.comment_ranges.is_empty());
    }

    #[test]
    fn test_cell_annotation_lands_on_open_cell() {
        let mut collector = DepthCollector::new(false, false);
        collector.set_caret(Some(4));
        plain_paragraph(&mut collector, "wide");
        collector.annotate_open_cell(3, false);
        let part = collector.finish();
        let cell = &part.tables[0].rows[0].cells[0];
        assert_eq!(cell.grid_span, 3);
        assert!(!cell.merged_from_above);
    }
}
