//! The recursive part walk.
//!
//! One walker flattens one content part. Structural elements steer the
//! collector's caret by their computed depth; content elements append text,
//! markers, and placeholders to the run under construction. Everything else
//! is either walked through or skipped by role.

use crate::extract::collector::{CollectedPart, DepthCollector};
use crate::extract::lists::{ListItem, ListTracker};
use crate::extract::roles::{get_attr, node_role, AttrScope, Role};
use crate::extract::styles::{paragraph_signature, paragraph_style_name, run_signature};
use crate::extract::Warnings;
use crate::parser::xml::{NodeId, XmlTree};
use crate::parser::{ExtractOptions, NumberingDefs, RelMap};

/// What one part walk produced.
pub(crate) struct WalkOutcome {
    pub part: CollectedPart,
    pub warnings: Warnings,
}

pub(crate) struct PartWalker<'a> {
    tree: &'a XmlTree,
    rels: &'a RelMap,
    defs: &'a NumberingDefs,
    options: &'a ExtractOptions,
    collector: DepthCollector,
    lists: ListTracker<'a>,
    warnings: Warnings,
}

impl<'a> PartWalker<'a> {
    pub fn new(
        tree: &'a XmlTree,
        rels: &'a RelMap,
        defs: &'a NumberingDefs,
        options: &'a ExtractOptions,
    ) -> Self {
        Self {
            tree,
            rels,
            defs,
            options,
            collector: DepthCollector::new(options.html, options.paragraph_styles),
            lists: ListTracker::new(defs),
            warnings: Warnings::default(),
        }
    }

    /// Walk the whole part and hand over what it collected.
    pub fn run(mut self) -> WalkOutcome {
        let root = self.tree.root();
        self.walk(root);
        WalkOutcome {
            part: self.collector.finish(),
            warnings: self.warnings,
        }
    }

    /// Realign the caret, dispatch by role, recurse, clean up, realign again.
    ///
    /// The second realignment is what seals an element's branches: a table
    /// returning to depth 1 pushes its last open row and cell shut.
    fn walk(&mut self, id: NodeId) {
        let role = node_role(self.tree, id);
        match role {
            Role::Unknown => {
                self.warnings.push(format!(
                    "skipped unrecognized element <{}>",
                    self.tree.raw_name(id)
                ));
                return;
            }
            // The fallback branch duplicates its sibling rendering.
            Role::Fallback => return,
            _ => {}
        }
        let depth = element_depth(self.tree, id);
        self.collector.set_caret(depth);
        if self.open_element(id, role) {
            let children = self.tree.children(id).to_vec();
            for child in children {
                self.walk(child);
            }
        }
        self.close_element(id, role);
        self.collector.set_caret(depth);
    }

    /// Handle an element on the way down. Returns whether to walk into it.
    fn open_element(&mut self, id: NodeId, role: Role) -> bool {
        match role {
            Role::Paragraph => {
                self.open_paragraph(id);
                true
            }
            Role::Run => {
                self.collector.commence_run(run_signature(self.tree, id));
                true
            }
            Role::Text | Role::MathText => {
                self.collector.add_text(self.tree.text(id));
                true
            }
            Role::Break => {
                self.collector.add_markup("\n");
                true
            }
            Role::Tab => {
                self.collector.insert_as_new_run("\t");
                true
            }
            Role::Symbol => {
                self.open_symbol(id);
                true
            }
            Role::Math => {
                self.open_math(id);
                false
            }
            Role::Hyperlink => {
                self.open_hyperlink(id);
                false
            }
            Role::Footnote => self.open_note(id, "footnote"),
            Role::Endnote => self.open_note(id, "endnote"),
            Role::FootnoteReference => {
                self.note_reference(id, "footnote");
                true
            }
            Role::EndnoteReference => {
                self.note_reference(id, "endnote");
                true
            }
            Role::Image => {
                self.image_reference(id, "embed");
                true
            }
            Role::ImageData => {
                self.image_reference(id, "id");
                true
            }
            Role::ImageAlt => {
                self.image_alt(id);
                true
            }
            Role::FormCheckBox => {
                self.form_checkbox(id);
                true
            }
            Role::FormDropDown => {
                self.form_dropdown(id);
                true
            }
            Role::CommentRangeStart => {
                if let Some(range_id) = get_attr(self.tree, id, AttrScope::Main, "id") {
                    self.collector.start_comment_range(range_id);
                }
                false
            }
            Role::CommentRangeEnd => {
                if let Some(range_id) = get_attr(self.tree, id, AttrScope::Main, "id") {
                    self.collector.end_comment_range(range_id);
                }
                false
            }
            Role::Properties | Role::Bookmark => false,
            Role::Document
            | Role::Body
            | Role::Table
            | Role::TableRow
            | Role::TableCell
            | Role::Container => true,
            Role::Fallback | Role::Unknown => false,
        }
    }

    /// Handle an element on the way back up, before its caret realignment.
    fn close_element(&mut self, id: NodeId, role: Role) {
        match role {
            Role::Paragraph => self.collector.conclude_paragraph(),
            Role::Run => self.collector.conclude_run(),
            Role::TableCell => self.annotate_cell(id),
            _ => {}
        }
    }

    fn open_paragraph(&mut self, id: NodeId) {
        let tree = self.tree;
        let style = paragraph_style_name(tree, id);
        let signature = paragraph_signature(tree, id);
        let list = self.list_item(id);
        self.collector.commence_paragraph(style, signature, Some(id), list);
    }

    /// Numbering reference of a paragraph: `pPr > numPr > numId / ilvl`.
    ///
    /// A paragraph without the full chain is not a list item. A present but
    /// unreadable level value counts as level zero.
    fn list_item(&mut self, paragraph: NodeId) -> Option<ListItem> {
        let tree = self.tree;
        let ppr = tree.find_child(paragraph, "pPr")?;
        let numpr = tree.find_child(ppr, "numPr")?;
        let num_id = tree
            .find_child(numpr, "numId")
            .and_then(|n| get_attr(tree, n, AttrScope::Main, "val"))?;
        let ilvl_node = tree.find_child(numpr, "ilvl")?;
        let ilvl = get_attr(tree, ilvl_node, AttrScope::Main, "val")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
        self.lists.item(num_id, ilvl, &mut self.warnings)
    }

    /// Symbols carry their glyph in a `w:char` attribute, conventionally a
    /// private-use code whose low byte is the glyph index in `w:font`.
    /// Rendered as a span so the font survives into the output.
    fn open_symbol(&mut self, id: NodeId) {
        let tree = self.tree;
        let Some(ch) = get_attr(tree, id, AttrScope::Main, "char") else {
            return;
        };
        let Some(tail) = ch.get(1..).filter(|t| !t.is_empty()) else {
            return;
        };
        let entity = format!("&#x0{tail};");
        match get_attr(tree, id, AttrScope::Main, "font") {
            Some(font) => self
                .collector
                .add_markup(&format!("<span style=font-family:{font}>{entity}</span>")),
            None => self.collector.add_markup(&entity),
        }
    }

    /// Equations are not translated; their bare text is fenced so callers
    /// can find and post-process them.
    fn open_math(&mut self, id: NodeId) {
        let text = self.tree.itertext(id);
        self.collector.insert_as_new_run(&format!("<latex>{text}</latex>"));
    }

    fn open_hyperlink(&mut self, id: NodeId) {
        let tree = self.tree;
        let text = self.flatten_subtree(id);
        let Some(rel_id) = get_attr(tree, id, AttrScope::Rel, "id") else {
            // in-document anchor links keep their text, nothing to resolve
            self.collector.insert_as_new_run(&text);
            return;
        };
        match self.rels.target_of(rel_id) {
            Some(target) => {
                let mut href = target.to_owned();
                if let Some(anchor) = get_attr(tree, id, AttrScope::Main, "anchor") {
                    href.push('#');
                    href.push_str(anchor);
                }
                self.collector
                    .insert_as_new_run(&format!("<a href=\"{href}\">{text}</a>"));
            }
            None => {
                self.warnings
                    .push(format!("hyperlink references missing relationship {rel_id}"));
                self.collector.insert_as_new_run(&text);
            }
        }
    }

    /// A note body in the footnotes or endnotes part. Real notes get a
    /// `footnote2)\t` lead-in that the note's first paragraph adopts;
    /// separator stubs are layout artifacts and never reach the output.
    fn open_note(&mut self, id: NodeId, kind: &str) -> bool {
        let tree = self.tree;
        let note_type = get_attr(tree, id, AttrScope::Main, "type").unwrap_or("");
        if note_type.to_ascii_lowercase().contains("separator") {
            return false;
        }
        if let Some(note_id) = get_attr(tree, id, AttrScope::Main, "id") {
            self.collector.insert_as_new_run(&format!("{kind}{note_id})\t"));
        }
        true
    }

    fn note_reference(&mut self, id: NodeId, kind: &str) {
        if let Some(note_id) = get_attr(self.tree, id, AttrScope::Main, "id") {
            self.collector
                .insert_as_new_run(&format!("----{kind}{note_id}----"));
        }
    }

    /// Images become `----media/image1.png----` placeholders; the binary
    /// itself is available from the document's image map.
    fn image_reference(&mut self, id: NodeId, attr: &str) {
        let tree = self.tree;
        let Some(rel_id) = get_attr(tree, id, AttrScope::Rel, attr) else {
            return;
        };
        match self.rels.target_of(rel_id) {
            Some(target) => self.collector.insert_as_new_run(&format!("----{target}----")),
            None => self
                .warnings
                .push(format!("image references missing relationship {rel_id}")),
        }
    }

    fn image_alt(&mut self, id: NodeId) {
        if let Some(descr) = get_attr(self.tree, id, AttrScope::Plain, "descr") {
            self.collector
                .insert_as_new_run(&format!("----Image alt text---->{descr}<"));
        }
    }

    fn form_checkbox(&mut self, id: NodeId) {
        let glyph = checkbox_state(self.tree, id).and_then(|state| match state.as_str() {
            "0" | "false" => Some("\u{2610}"),
            "1" | "true" => Some("\u{2612}"),
            _ => None,
        });
        match glyph {
            Some(glyph) => self.collector.insert_as_new_run(glyph),
            None => {
                self.warnings.push("unreadable checkbox state".to_owned());
                self.collector.insert_as_new_run("----checkbox failed----");
            }
        }
    }

    fn form_dropdown(&mut self, id: NodeId) {
        let tree = self.tree;
        let mut entries: Vec<&str> = Vec::new();
        let mut selected = 0usize;
        for node in tree.descendants(id) {
            match tree.local(node) {
                "listEntry" => {
                    entries.push(get_attr(tree, node, AttrScope::Main, "val").unwrap_or(""));
                }
                "result" => {
                    selected = get_attr(tree, node, AttrScope::Main, "val")
                        .and_then(|v| v.parse().ok())
                        .unwrap_or(0);
                }
                _ => {}
            }
        }
        match entries.get(selected) {
            Some(entry) => self.collector.insert_as_new_run(entry),
            None => {
                self.warnings
                    .push(format!("dropdown selection {selected} out of range"));
                self.collector.insert_as_new_run("----dropdown failed----");
            }
        }
    }

    /// Record a closing cell's merge geometry while the cell is still open.
    /// The normalization pass applies it once the table is complete.
    fn annotate_cell(&mut self, cell: NodeId) {
        let tree = self.tree;
        let Some(pr) = tree.find_child(cell, "tcPr") else {
            return;
        };
        let span = tree
            .find_child(pr, "gridSpan")
            .and_then(|n| get_attr(tree, n, AttrScope::Main, "val"))
            .and_then(|v| v.parse().ok())
            .unwrap_or(1);
        let merged = match tree.find_child(pr, "vMerge") {
            // a bare continuation marker carries no value at all
            Some(v) => match get_attr(tree, v, AttrScope::Main, "val") {
                None => true,
                Some(val) => val.eq_ignore_ascii_case("continue"),
            },
            None => false,
        };
        self.collector.annotate_open_cell(span, merged);
    }

    /// Flatten an element's children to plain text for re-insertion, as for
    /// the visible text of a link.
    fn flatten_subtree(&mut self, id: NodeId) -> String {
        element_text(self.tree, self.rels, self.defs, self.options, id, &mut self.warnings)
    }
}

/// Depth of an element in the output model: 4 minus the distance to its
/// nearest descendant paragraph, never below 1.
///
/// The search is width-first, so a cell with a paragraph of its own sits at
/// depth 3 even when it also holds a nested table. Part roots and body
/// wrappers report no depth at all, and so does anything with no paragraph
/// below it: both would otherwise realign the caret on elements that
/// contribute nothing.
pub(crate) fn element_depth(tree: &XmlTree, id: NodeId) -> Option<usize> {
    match node_role(tree, id) {
        Role::Document | Role::Body => return None,
        _ => {}
    }
    let mut frontier = vec![id];
    let mut distance = 0usize;
    while !frontier.is_empty() {
        if frontier
            .iter()
            .any(|&n| node_role(tree, n) == Role::Paragraph)
        {
            return Some(4usize.saturating_sub(distance).max(1));
        }
        let next: Vec<NodeId> = frontier
            .iter()
            .flat_map(|&n| tree.children(n).iter().copied())
            .collect();
        frontier = next;
        distance += 1;
    }
    None
}

/// Flatten one element's content to text with a throwaway walker, paragraphs
/// joined by blank lines. Used for link text and comment bodies; style
/// descriptor runs are never injected into these projections.
pub(crate) fn element_text(
    tree: &XmlTree,
    rels: &RelMap,
    defs: &NumberingDefs,
    options: &ExtractOptions,
    id: NodeId,
    warnings: &mut Warnings,
) -> String {
    let mut sub = PartWalker {
        tree,
        rels,
        defs,
        options,
        collector: DepthCollector::new(options.html, false),
        lists: ListTracker::new(defs),
        warnings: Warnings::default(),
    };
    for &child in tree.children(id) {
        sub.walk(child);
    }
    let part = sub.collector.finish();
    warnings.extend(sub.warnings);

    let mut pars: Vec<String> = Vec::new();
    for table in &part.tables {
        for row in &table.rows {
            for cell in &row.cells {
                for par in &cell.paragraphs {
                    pars.push(par.text());
                }
            }
        }
    }
    pars.join("\n\n")
}

/// Checkbox state string: an explicit `w:checked` wins over `w:default`,
/// and a bare `w:checked` with no value counts as checked.
fn checkbox_state(tree: &XmlTree, check_box: NodeId) -> Option<String> {
    let nodes = tree.descendants(check_box);
    for &node in &nodes {
        if tree.local(node) == "checked" {
            let val = get_attr(tree, node, AttrScope::Main, "val").unwrap_or("1");
            return Some(val.to_owned());
        }
    }
    for &node in &nodes {
        if tree.local(node) == "default" {
            return get_attr(tree, node, AttrScope::Main, "val").map(str::to_owned);
        }
    }
    None
}
