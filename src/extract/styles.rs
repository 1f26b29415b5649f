//! Inline formatting signatures and their HTML-style markers.
//!
//! A run's formatting collapses into a canonically ordered list of marker
//! strings: one `span style="…"` entry collecting the property styles
//! (sorted, `;`-joined), then bare tags in alphabetical order. The canonical
//! order is what lets the merger compare signatures for equality and the
//! renderer diff them between adjacent runs instead of re-wrapping every run.

use crate::extract::roles::{get_attr, AttrScope};
use crate::model::Run;
use crate::parser::xml::{NodeId, XmlTree};

/// Paragraph styles rendered as markers of their own.
const HEADING_STYLES: [(&str, &str); 6] = [
    ("Heading1", "h1"),
    ("Heading2", "h2"),
    ("Heading3", "h3"),
    ("Heading4", "h4"),
    ("Heading5", "h5"),
    ("Heading6", "h6"),
];

/// Collect `(tag, w:val)` pairs from a property bag child (`w:rPr`, `w:pPr`).
/// A repeated tag replaces its earlier value, matching last-wins attribute
/// semantics; a tag without `w:val` records an empty value.
fn gather_pr(tree: &XmlTree, id: NodeId, bag: &str) -> Vec<(String, String)> {
    let mut vals: Vec<(String, String)> = Vec::new();
    let Some(pr) = tree.find_child(id, bag) else {
        return vals;
    };
    for &child in tree.children(pr) {
        let local = tree.local(child).to_owned();
        let val = get_attr(tree, child, AttrScope::Main, "val")
            .unwrap_or_default()
            .to_owned();
        match vals.iter_mut().find(|(tag, _)| *tag == local) {
            Some(entry) => entry.1 = val,
            None => vals.push((local, val)),
        }
    }
    vals
}

/// Reduce gathered run properties to the canonical marker list.
fn format_signature(props: &[(String, String)]) -> Vec<String> {
    let mut span_styles: Vec<String> = Vec::new();
    let mut bare: Vec<String> = Vec::new();
    for (tag, val) in props {
        match tag.as_str() {
            "b" | "i" | "u" => bare.push(tag.clone()),
            "strike" => bare.push("s".to_owned()),
            // "superscript" -> "sup", "subscript" -> "sub"
            "vertAlign" if !val.is_empty() => bare.push(val.chars().take(3).collect()),
            "smallCaps" => span_styles.push("font-variant:small-caps".to_owned()),
            "caps" => span_styles.push("text-transform:uppercase".to_owned()),
            "highlight" => span_styles.push(format!("background-color:{val}")),
            "sz" => span_styles.push(format!("font-size:{val}pt")),
            "color" => span_styles.push(format!("color:{val}")),
            _ => {}
        }
    }
    let mut signature = Vec::new();
    if !span_styles.is_empty() {
        span_styles.sort();
        signature.push(format!("span style=\"{}\"", span_styles.join(";")));
    }
    bare.sort();
    signature.append(&mut bare);
    signature
}

/// Formatting signature of a `w:r` element.
pub(crate) fn run_signature(tree: &XmlTree, run: NodeId) -> Vec<String> {
    format_signature(&gather_pr(tree, run, "rPr"))
}

/// Marker list for a paragraph's own style: heading styles become `h1`..`h6`,
/// everything else renders nothing.
pub(crate) fn paragraph_signature(tree: &XmlTree, paragraph: NodeId) -> Vec<String> {
    let Some(name) = paragraph_style_name(tree, paragraph) else {
        return Vec::new();
    };
    HEADING_STYLES
        .iter()
        .find(|(style, _)| *style == name)
        .map(|(_, tag)| vec![(*tag).to_owned()])
        .unwrap_or_default()
}

/// Resolved `w:pStyle` name of a paragraph, if declared.
pub(crate) fn paragraph_style_name(tree: &XmlTree, paragraph: NodeId) -> Option<String> {
    let ppr = tree.find_child(paragraph, "pPr")?;
    let pstyle = tree.find_child(ppr, "pStyle")?;
    get_attr(tree, pstyle, AttrScope::Main, "val").map(str::to_owned)
}

/// Opening markers for a signature, in canonical order.
pub(crate) fn open_markers(signature: &[String]) -> String {
    signature.iter().map(|s| format!("<{s}>")).collect()
}

/// Closing markers for an open list, innermost (last-opened) first.
pub(crate) fn close_markers(open: &[String]) -> String {
    open.iter().rev().map(|s| close_marker(s)).collect()
}

fn close_marker(marker: &str) -> String {
    // `span style="…"` closes as `</span>`
    let tag = marker.split_whitespace().next().unwrap_or(marker);
    format!("</{tag}>")
}

/// Escape `&`, `<`, `>`. Applied exactly once, when document text enters a
/// run in HTML mode; inserted markup never passes through here.
pub(crate) fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Distribute style markers over a concluded paragraph's runs.
///
/// A carried stack of open markers persists across the run sequence: each
/// non-empty run closes back to the longest prefix it shares with the stack
/// (innermost first), then opens the rest of its own signature, and the last
/// non-empty run closes whatever remains open. Closing to the shared prefix
/// keeps markers properly nested even when signatures overlap: a style kept
/// across a transition but below a closed one is closed and reopened.
/// Markers never span a paragraph boundary and the same marker kind never
/// nests. Empty runs neither emit nor disturb markers.
pub(crate) fn decorate_runs(runs: &mut [Run]) {
    let mut open: Vec<String> = Vec::new();
    for run in runs.iter_mut().filter(|r| !r.text.is_empty()) {
        // signatures are canonically ordered, so a shared style sits at the
        // same position in both lists
        let shared = open
            .iter()
            .zip(run.style.iter())
            .take_while(|(kept, wanted)| kept == wanted)
            .count();
        let mut markers = String::new();
        for marker in open.split_off(shared).iter().rev() {
            markers.push_str(&close_marker(marker));
        }
        for marker in &run.style[shared..] {
            markers.push('<');
            markers.push_str(marker);
            markers.push('>');
            open.push(marker.clone());
        }
        if !markers.is_empty() {
            run.text.insert_str(0, &markers);
        }
    }
    if open.is_empty() {
        return;
    }
    if let Some(last) = runs.iter_mut().rev().find(|r| !r.text.is_empty()) {
        last.text.push_str(&close_markers(&open));
    }
}
