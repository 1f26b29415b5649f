//! Merging of equivalent adjacent elements before text collection.
//!
//! Word splits logically continuous text into fragments around spell-check
//! regions, revision seams, and cursor history. Collapsing equivalent
//! neighbors up front re-joins words split mid-syllable and turns a chain of
//! identical hyperlink fragments into a single link. The pass rewrites the
//! parsed tree in place and never fails: a dangling relationship id simply
//! keys on the raw id so equal fragments still coalesce.

use crate::extract::roles::{get_attr, node_role, AttrScope, Role};
use crate::extract::styles::run_signature;
use crate::parser::RelMap;
use crate::parser::xml::{NodeId, XmlTree};

/// Everything that participates in merging needs an identity; two siblings
/// merge only when their keys are equal.
#[derive(Debug, PartialEq)]
struct MergeKey {
    role: Role,
    /// Hyperlinks: resolved target plus fragment anchor.
    target: String,
    /// Runs: canonical formatting signature.
    signature: Vec<String>,
    /// Runs carrying a break, tab, image, or other non-text payload get a
    /// key unique to themselves so they never coalesce and the payload
    /// keeps its position between text fragments.
    pinned: Option<NodeId>,
}

/// Merge adjacent equivalent elements throughout one part tree.
pub(crate) fn merge_tree(tree: &mut XmlTree, rels: &RelMap) {
    merge_level(tree, rels, tree.root());
}

/// Adjacent siblings sharing a key, plus the no-content markers that sat
/// between them.
struct Group {
    role: Role,
    members: Vec<NodeId>,
    absorbed: Vec<NodeId>,
}

fn merge_level(tree: &mut XmlTree, rels: &RelMap, id: NodeId) {
    // Adjacency ignores siblings with no content anywhere beneath them:
    // a proofErr marker between two halves of a word must not keep them
    // apart. Content-bearing siblings that are not mergeable still split
    // groups, so text never jumps across a comment range boundary. A
    // marker swallowed by a merge leaves the tree with the fragments it
    // sat between; markers outside any merged group stay where they are.
    let mut groups: Vec<Group> = Vec::new();
    let mut current: Option<MergeKey> = None;
    let mut skipped: Vec<NodeId> = Vec::new();
    for &child in tree.children(id) {
        if !has_content(tree, child) {
            skipped.push(child);
            continue;
        }
        let key = merge_key(tree, rels, child);
        if key.is_some() && key == current {
            if let Some(group) = groups.last_mut() {
                group.members.push(child);
                group.absorbed.append(&mut skipped);
            }
            continue;
        }
        skipped.clear();
        if let Some(k) = &key {
            groups.push(Group {
                role: k.role,
                members: vec![child],
                absorbed: Vec::new(),
            });
        }
        current = key;
    }

    for group in groups.into_iter().filter(|g| g.members.len() > 1) {
        let first = group.members[0];
        match group.role {
            Role::Text | Role::MathText => {
                let mut text = tree.text(first).to_owned();
                for &rest in &group.members[1..] {
                    text.push_str(tree.text(rest));
                }
                tree.set_text(first, text);
            }
            _ => {
                for &rest in &group.members[1..] {
                    tree.adopt_children(first, rest);
                }
            }
        }
        for &rest in group.members[1..].iter().chain(&group.absorbed) {
            tree.remove_child(id, rest);
        }
    }

    for child in tree.children(id).to_vec() {
        merge_level(tree, rels, child);
    }
}

fn has_content(tree: &XmlTree, id: NodeId) -> bool {
    tree.descendants(id)
        .into_iter()
        .any(|d| node_role(tree, d).is_content())
}

fn merge_key(tree: &XmlTree, rels: &RelMap, id: NodeId) -> Option<MergeKey> {
    let role = node_role(tree, id);
    match role {
        Role::Run => {
            let special = tree
                .descendants(id)
                .into_iter()
                .skip(1)
                .any(|d| is_special_content(node_role(tree, d)));
            Some(MergeKey {
                role,
                target: String::new(),
                signature: run_signature(tree, id),
                pinned: special.then_some(id),
            })
        }
        Role::Hyperlink => Some(MergeKey {
            role,
            target: hyperlink_identity(tree, rels, id),
            signature: Vec::new(),
            pinned: None,
        }),
        Role::Text | Role::MathText => Some(MergeKey {
            role,
            target: String::new(),
            signature: Vec::new(),
            pinned: None,
        }),
        _ => None,
    }
}

fn is_special_content(role: Role) -> bool {
    matches!(
        role,
        Role::Break
            | Role::Tab
            | Role::Symbol
            | Role::Math
            | Role::Image
            | Role::ImageData
            | Role::ImageAlt
            | Role::FootnoteReference
            | Role::EndnoteReference
            | Role::FormCheckBox
            | Role::FormDropDown
    )
}

fn hyperlink_identity(tree: &XmlTree, rels: &RelMap, id: NodeId) -> String {
    let target = match get_attr(tree, id, AttrScope::Rel, "id") {
        Some(rid) => rels.target_of(rid).unwrap_or(rid).to_owned(),
        None => String::new(),
    };
    match get_attr(tree, id, AttrScope::Main, "anchor") {
        Some(anchor) => format!("{target}#{anchor}"),
        None => target,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const W: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
    const R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

    fn parse(body: &str) -> XmlTree {
        let xml = format!(r#"<w:p xmlns:w="{W}" xmlns:r="{R}">{body}</w:p>"#);
        XmlTree::parse(xml.as_bytes(), "test").unwrap()
    }

    fn run_texts(tree: &XmlTree) -> Vec<String> {
        tree.children(tree.root())
            .iter()
            .map(|&c| tree.itertext(c))
            .collect()
    }

    #[test]
    fn test_split_word_rejoins() {
        let mut tree = parse(
            "<w:r><w:t>work to im</w:t></w:r>\
             <w:r><w:t>prove</w:t></w:r>",
        );
        merge_tree(&mut tree, &RelMap::empty());
        assert_eq!(tree.children(tree.root()).len(), 1);
        let run = tree.children(tree.root())[0];
        assert_eq!(tree.children(run).len(), 1);
        assert_eq!(tree.itertext(run), "work to improve");
    }

    #[test]
    fn test_different_formatting_stays_apart() {
        let mut tree = parse(
            "<w:r><w:rPr><w:b/></w:rPr><w:t>bold</w:t></w:r>\
             <w:r><w:t>plain</w:t></w:r>",
        );
        merge_tree(&mut tree, &RelMap::empty());
        assert_eq!(run_texts(&tree), ["bold", "plain"]);
    }

    #[test]
    fn test_proof_err_does_not_split_group() {
        let mut tree = parse(
            "<w:r><w:t>hy</w:t></w:r>\
             <w:proofErr w:type=\"spellStart\"/>\
             <w:r><w:t>phen</w:t></w:r>",
        );
        merge_tree(&mut tree, &RelMap::empty());
        assert_eq!(tree.children(tree.root()).len(), 1);
        assert_eq!(run_texts(&tree), ["hyphen"]);
    }

    #[test]
    fn test_marker_between_unmergeable_runs_survives() {
        let mut tree = parse(
            "<w:r><w:rPr><w:b/></w:rPr><w:t>bold</w:t></w:r>\
             <w:proofErr w:type=\"spellEnd\"/>\
             <w:r><w:t>plain</w:t></w:r>",
        );
        merge_tree(&mut tree, &RelMap::empty());
        assert_eq!(tree.children(tree.root()).len(), 3);
        assert_eq!(run_texts(&tree), ["bold", "", "plain"]);
    }

    #[test]
    fn test_comment_range_splits_group() {
        let mut tree = parse(
            "<w:r><w:t>before</w:t></w:r>\
             <w:commentRangeStart w:id=\"0\"/>\
             <w:r><w:t>after</w:t></w:r>",
        );
        merge_tree(&mut tree, &RelMap::empty());
        assert_eq!(run_texts(&tree), ["before", "", "after"]);
    }

    #[test]
    fn test_same_link_fragments_merge() {
        let mut tree = parse(
            "<w:hyperlink r:id=\"rId4\"><w:r><w:t>click </w:t></w:r></w:hyperlink>\
             <w:hyperlink r:id=\"rId4\"><w:r><w:t>here</w:t></w:r></w:hyperlink>",
        );
        merge_tree(&mut tree, &RelMap::empty());
        assert_eq!(run_texts(&tree), ["click here"]);
        // inner runs merged too
        let link = tree.children(tree.root())[0];
        assert_eq!(tree.children(link).len(), 1);
    }

    #[test]
    fn test_different_links_stay_apart() {
        let mut tree = parse(
            "<w:hyperlink r:id=\"rId4\"><w:r><w:t>one</w:t></w:r></w:hyperlink>\
             <w:hyperlink r:id=\"rId5\"><w:r><w:t>two</w:t></w:r></w:hyperlink>",
        );
        merge_tree(&mut tree, &RelMap::empty());
        assert_eq!(run_texts(&tree), ["one", "two"]);
    }

    #[test]
    fn test_break_run_never_merges() {
        let mut tree = parse(
            "<w:r><w:t>a</w:t></w:r>\
             <w:r><w:br/></w:r>\
             <w:r><w:t>b</w:t></w:r>",
        );
        merge_tree(&mut tree, &RelMap::empty());
        assert_eq!(tree.children(tree.root()).len(), 3);
    }

    #[test]
    fn test_empty_runs_join_their_neighbors() {
        let mut tree = parse(
            "<w:r><w:t>a</w:t></w:r>\
             <w:r/>\
             <w:r><w:t>b</w:t></w:r>",
        );
        merge_tree(&mut tree, &RelMap::empty());
        assert_eq!(run_texts(&tree), ["ab"]);
    }

    #[test]
    fn test_text_fragments_inside_one_run_merge() {
        let mut tree = parse("<w:r><w:t>one </w:t><w:t>two</w:t></w:r>");
        merge_tree(&mut tree, &RelMap::empty());
        let run = tree.children(tree.root())[0];
        assert_eq!(tree.children(run).len(), 1);
        assert_eq!(tree.text(tree.children(run)[0]), "one two");
    }
}
