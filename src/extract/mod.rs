//! The extraction engine.
//!
//! One [`extract_document`] call turns an opened package into a [`Document`]:
//! numbering definitions load first, then every content part is merged,
//! walked, and normalized, and finally comments and core properties are
//! reconciled against the collected body.
//!
//! Parts never share mutable state. Each job owns its tree and relationship
//! map and numbering counters restart per part, so the jobs fan out across
//! rayon workers without locks; the assembly loop puts the results back in
//! reading order.

mod collector;
mod lists;
mod merge;
mod normalize;
pub(crate) mod roles;
mod styles;
mod walker;

use std::collections::HashMap;

use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::extract::normalize::normalize_table;
use crate::extract::roles::{get_attr, AttrScope};
use crate::extract::walker::PartWalker;
use crate::model::{Comment, CoreProperties, Document, Table};
use crate::parser::xml::{NodeId, XmlTree};
use crate::parser::{
    parse_core_properties, ContentParts, ExtractOptions, NumberingDefs, Package, RelMap,
};

/// Warning sink carried through extraction.
///
/// Every anomaly is logged as it happens and kept for
/// [`Document::warnings`], so callers see the full list even without a
/// logger installed.
#[derive(Debug, Default)]
pub(crate) struct Warnings {
    entries: Vec<String>,
}

impl Warnings {
    pub fn push(&mut self, message: String) {
        log::warn!("{}", message);
        self.entries.push(message);
    }

    /// Absorb another sink's entries, preserving their order.
    pub fn extend(&mut self, other: Warnings) {
        self.entries.extend(other.entries);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.entries
    }
}

/// One content part's isolated extraction input. Owns everything the walk
/// needs so the job can run on a worker thread.
struct PartJob {
    name: String,
    tree: XmlTree,
    rels: RelMap,
}

/// What one content part's extraction produced.
struct PartOutcome {
    name: String,
    tables: Vec<Table>,
    comment_references: HashMap<String, String>,
    warnings: Warnings,
}

/// Merge adjacent equivalents, walk the part, normalize its tables.
fn run_part(mut job: PartJob, defs: &NumberingDefs, options: &ExtractOptions) -> PartOutcome {
    merge::merge_tree(&mut job.tree, &job.rels);
    let outcome = PartWalker::new(&job.tree, &job.rels, defs, options).run();
    let mut tables = outcome.part.tables;
    // Comment ranges are resolved before normalization: duplicating merged
    // cells clones runs into covered grid positions and would shift every
    // ordinal recorded after a spanned table.
    let comment_references = resolve_comment_ranges(&tables, &outcome.part.comment_ranges);
    for table in &mut tables {
        normalize_table(table, options.duplicate_merged_cells);
    }
    PartOutcome {
        name: job.name,
        tables,
        comment_references,
        warnings: outcome.warnings,
    }
}

/// Slice the part's run sequence at each recorded range, yielding the text
/// every comment annotates. Ordinals count non-empty runs, the same way the
/// walk counted them.
fn resolve_comment_ranges(
    tables: &[Table],
    ranges: &HashMap<String, (usize, usize)>,
) -> HashMap<String, String> {
    if ranges.is_empty() {
        return HashMap::new();
    }
    let runs: Vec<&str> = tables
        .iter()
        .flat_map(|t| t.rows.iter())
        .flat_map(|r| r.cells.iter())
        .flat_map(|c| c.paragraphs.iter())
        .flat_map(|p| p.runs.iter())
        .filter(|run| !run.text.is_empty())
        .map(|run| run.text.as_str())
        .collect();
    ranges
        .iter()
        .map(|(id, &(beg, end))| {
            let end = end.min(runs.len());
            let beg = beg.min(end);
            (id.clone(), runs[beg..end].concat())
        })
        .collect()
}

/// Extract the whole document from an opened package.
pub(crate) fn extract_document(
    package: &mut Package,
    options: &ExtractOptions,
) -> Result<Document> {
    let parts = package.content_parts().clone();
    let mut warnings = Warnings::default();

    let defs = load_numbering(package, &parts, options, &mut warnings)?;

    let mut jobs: Vec<PartJob> = Vec::new();
    for name in parts.reading_order() {
        let Some(bytes) = package.part(name) else {
            if options.strict {
                return Err(Error::MissingPart(name.to_owned()));
            }
            warnings.push(format!("{}: listed part missing from archive", name));
            continue;
        };
        let tree = match XmlTree::parse(bytes, name) {
            Ok(tree) => tree,
            Err(e) if options.strict => return Err(e),
            Err(e) => {
                warnings.push(format!("{}: skipped unreadable part: {}", name, e));
                continue;
            }
        };
        jobs.push(PartJob {
            name: name.to_owned(),
            tree,
            rels: package.rels_for(name).clone(),
        });
    }
    log::debug!("extracting {} content parts", jobs.len());

    let outcomes: Vec<PartOutcome> = if options.parallel && jobs.len() > 1 {
        jobs.into_par_iter()
            .map(|job| run_part(job, &defs, options))
            .collect()
    } else {
        jobs.into_iter()
            .map(|job| run_part(job, &defs, options))
            .collect()
    };

    let mut document = Document::new();
    let mut main_references: HashMap<String, String> = HashMap::new();
    for outcome in outcomes {
        let PartOutcome {
            name,
            tables,
            comment_references,
            warnings: from_part,
        } = outcome;
        warnings.extend(from_part);
        if name == parts.main {
            main_references = comment_references;
            document.body = tables;
        } else if parts.headers.contains(&name) {
            document.headers.extend(tables);
        } else if parts.footers.contains(&name) {
            document.footers.extend(tables);
        } else if parts.footnotes.as_deref() == Some(name.as_str()) {
            document.footnotes = tables;
        } else if parts.endnotes.as_deref() == Some(name.as_str()) {
            document.endnotes = tables;
        }
    }

    document.comments = build_comments(
        package,
        &parts,
        &main_references,
        &defs,
        options,
        &mut warnings,
    )?;
    document.core_properties = load_core_properties(package, &parts, options, &mut warnings)?;
    document.images = package.images();

    if !warnings.is_empty() {
        log::debug!("extraction finished with {} warnings", warnings.len());
    }
    document.warnings = warnings.into_vec();
    Ok(document)
}

fn load_numbering(
    package: &Package,
    parts: &ContentParts,
    options: &ExtractOptions,
    warnings: &mut Warnings,
) -> Result<NumberingDefs> {
    let Some(name) = parts.numbering.as_deref() else {
        return Ok(NumberingDefs::empty());
    };
    let Some(bytes) = package.part(name) else {
        warnings.push(format!("{}: listed part missing from archive", name));
        return Ok(NumberingDefs::empty());
    };
    match NumberingDefs::parse(name, bytes) {
        Ok(defs) => Ok(defs),
        Err(e) if options.strict => Err(e),
        Err(e) => {
            warnings.push(format!("{}: unreadable numbering definitions: {}", name, e));
            Ok(NumberingDefs::empty())
        }
    }
}

/// Pair the comments part with the reference text recovered while walking
/// the body.
///
/// A count mismatch between comment elements and recorded ranges means the
/// pairing cannot be trusted, so the whole set is dropped with a warning
/// rather than misattributed.
fn build_comments(
    package: &mut Package,
    parts: &ContentParts,
    references: &HashMap<String, String>,
    defs: &NumberingDefs,
    options: &ExtractOptions,
    warnings: &mut Warnings,
) -> Result<Vec<Comment>> {
    let Some(name) = parts.comments.as_deref() else {
        return Ok(Vec::new());
    };
    let Some(bytes) = package.part(name) else {
        warnings.push(format!("{}: listed part missing from archive", name));
        return Ok(Vec::new());
    };
    let tree = match XmlTree::parse(bytes, name) {
        Ok(tree) => tree,
        Err(e) if options.strict => return Err(e),
        Err(e) => {
            warnings.push(format!("{}: skipped unreadable part: {}", name, e));
            return Ok(Vec::new());
        }
    };
    let rels = package.rels_for(name).clone();

    let comment_nodes: Vec<NodeId> = tree
        .children(tree.root())
        .iter()
        .copied()
        .filter(|&node| tree.local(node) == "comment")
        .collect();
    if comment_nodes.is_empty() {
        return Ok(Vec::new());
    }
    if comment_nodes.len() != references.len() {
        warnings.push(format!(
            "{}: {} comments but {} comment ranges in the body; dropping comments",
            name,
            comment_nodes.len(),
            references.len()
        ));
        return Ok(Vec::new());
    }

    let mut comments = Vec::with_capacity(comment_nodes.len());
    for node in comment_nodes {
        let id = get_attr(&tree, node, AttrScope::Main, "id")
            .unwrap_or("")
            .to_owned();
        let author = get_attr(&tree, node, AttrScope::Main, "author")
            .unwrap_or("")
            .to_owned();
        let date = get_attr(&tree, node, AttrScope::Main, "date")
            .unwrap_or("")
            .to_owned();
        let text = walker::element_text(&tree, &rels, defs, options, node, warnings);
        let reference = match references.get(&id) {
            Some(text) => text.clone(),
            None => {
                warnings.push(format!("comment {}: no matching range in the body", id));
                String::new()
            }
        };
        comments.push(Comment {
            reference,
            author,
            date,
            text,
        });
    }
    Ok(comments)
}

fn load_core_properties(
    package: &Package,
    parts: &ContentParts,
    options: &ExtractOptions,
    warnings: &mut Warnings,
) -> Result<Option<CoreProperties>> {
    let Some(name) = parts.core_properties.as_deref() else {
        warnings.push("no core properties part in package".to_owned());
        return Ok(None);
    };
    let Some(bytes) = package.part(name) else {
        warnings.push(format!("{}: listed part missing from archive", name));
        return Ok(None);
    };
    match parse_core_properties(name, bytes) {
        Ok(props) => Ok(Some(props)),
        Err(e) if options.strict => Err(e),
        Err(e) => {
            warnings.push(format!("{}: unreadable core properties: {}", name, e));
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NS: &str = concat!(
        "xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\" ",
        "xmlns:r=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships\""
    );

    fn job(body: &str) -> PartJob {
        let xml = format!("<w:document {NS}><w:body>{body}</w:body></w:document>");
        PartJob {
            name: "word/document.xml".to_owned(),
            tree: XmlTree::parse(xml.as_bytes(), "word/document.xml").unwrap(),
            rels: RelMap::empty(),
        }
    }

    #[test]
    fn test_warnings_preserve_order_across_sinks() {
        let mut first = Warnings::default();
        first.push("a".to_owned());
        let mut second = Warnings::default();
        second.push("b".to_owned());
        second.push("c".to_owned());
        first.extend(second);
        assert_eq!(first.len(), 3);
        assert_eq!(first.into_vec(), ["a", "b", "c"]);
    }

    #[test]
    fn test_run_part_merges_before_walking() {
        let outcome = run_part(
            job("<w:p><w:r><w:t>work to im</w:t></w:r><w:r><w:t>prove</w:t></w:r></w:p>"),
            &NumberingDefs::empty(),
            &ExtractOptions::default(),
        );
        let runs = outcome.part_runs();
        assert_eq!(runs, ["work to improve"]);
    }

    #[test]
    fn test_run_part_normalizes_spanned_tables() {
        let outcome = run_part(
            job("<w:tbl>\
                 <w:tr><w:tc><w:tcPr><w:gridSpan w:val=\"2\"/></w:tcPr>\
                 <w:p><w:r><w:t>wide</w:t></w:r></w:p></w:tc></w:tr>\
                 <w:tr><w:tc><w:p><w:r><w:t>a</w:t></w:r></w:p></w:tc>\
                 <w:tc><w:p><w:r><w:t>b</w:t></w:r></w:p></w:tc></w:tr>\
                 </w:tbl>"),
            &NumberingDefs::empty(),
            &ExtractOptions::default(),
        );
        let table = &outcome.tables[0];
        assert!(table.is_rectangular());
        assert_eq!(table.rows[0].cells.len(), 2);
        assert!(!table.has_merged_cells());
    }

    #[test]
    fn test_comment_references_resolved_before_duplication() {
        let options = ExtractOptions::default().with_duplicate_merged_cells(true);
        let outcome = run_part(
            job("<w:tbl>\
                 <w:tr><w:tc><w:tcPr><w:gridSpan w:val=\"2\"/></w:tcPr>\
                 <w:p><w:r><w:t>wide</w:t></w:r></w:p></w:tc></w:tr>\
                 <w:tr><w:tc><w:p><w:r><w:t>a</w:t></w:r></w:p></w:tc>\
                 <w:tc><w:p><w:r><w:t>b</w:t></w:r></w:p></w:tc></w:tr>\
                 </w:tbl>\
                 <w:p><w:r><w:t>fine </w:t></w:r>\
                 <w:commentRangeStart w:id=\"0\"/>\
                 <w:r><w:t>target</w:t></w:r>\
                 <w:commentRangeEnd w:id=\"0\"/></w:p>"),
            &NumberingDefs::empty(),
            &options,
        );
        assert_eq!(outcome.comment_references["0"], "target");
    }

    impl PartOutcome {
        fn part_runs(&self) -> Vec<String> {
            self.tables
                .iter()
                .flat_map(|t| t.rows.iter())
                .flat_map(|r| r.cells.iter())
                .flat_map(|c| c.paragraphs.iter())
                .flat_map(|p| p.run_strings())
                .collect()
        }
    }
}
