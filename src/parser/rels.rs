//! Relationship (`.rels`) parts.
//!
//! Every content part may carry a sibling `_rels/<name>.rels` part mapping
//! relationship ids (`rId4`) to targets: other package parts, or external
//! URLs for hyperlinks. Hyperlink and image handling resolve through here.

use std::collections::HashMap;

use crate::parser::xml::XmlTree;
use crate::Result;

/// One relationship entry.
#[derive(Debug, Clone)]
pub struct Relationship {
    pub id: String,
    /// Full relationship type URI.
    pub rel_type: String,
    /// Target as written: package-relative path or external URL.
    pub target: String,
    /// True when `TargetMode="External"` (hyperlink URLs).
    pub external: bool,
}

/// Relationships of a single part, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct RelMap {
    by_id: HashMap<String, Relationship>,
}

impl RelMap {
    /// Empty map, used when a part has no `.rels` sibling.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse a `.rels` document.
    pub fn parse(part: &str, data: &[u8]) -> Result<Self> {
        let tree = XmlTree::parse(data, part)?;
        let mut by_id = HashMap::new();
        for &child in tree.children(tree.root()) {
            if tree.local(child) != "Relationship" {
                continue;
            }
            let plain = |name: &str| {
                tree.attr_where(child, |ns| ns.is_empty(), name)
                    .map(str::to_owned)
            };
            let (Some(id), Some(target)) = (plain("Id"), plain("Target")) else {
                log::warn!("{}: Relationship missing Id or Target, skipped", part);
                continue;
            };
            let external = plain("TargetMode").as_deref() == Some("External");
            by_id.insert(
                id.clone(),
                Relationship {
                    id,
                    rel_type: plain("Type").unwrap_or_default(),
                    target,
                    external,
                },
            );
        }
        Ok(Self { by_id })
    }

    pub fn get(&self, id: &str) -> Option<&Relationship> {
        self.by_id.get(id)
    }

    /// Target string for an id, if the id is known.
    pub fn target_of(&self, id: &str) -> Option<&str> {
        self.by_id.get(id).map(|r| r.target.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Relationship> {
        self.by_id.values()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

/// Package path of the `.rels` part describing `part`.
pub fn rels_path_for(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, name)) => format!("{}/_rels/{}.rels", dir, name),
        None => format!("_rels/{}.rels", part),
    }
}

/// Resolve a relationship target against the directory of its source part.
///
/// Targets may be package-absolute (`/word/media/image1.png`), relative
/// (`media/image1.png`), or climb out of the source directory
/// (`../customXml/item1.xml`).
pub fn resolve_target(source_part: &str, target: &str) -> String {
    if let Some(abs) = target.strip_prefix('/') {
        return abs.to_owned();
    }
    let mut segments: Vec<&str> = match source_part.rsplit_once('/') {
        Some((dir, _)) => dir.split('/').collect(),
        None => Vec::new(),
    };
    for seg in target.split('/') {
        match seg {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    const RELS: &[u8] = br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="media/image1.png"/>
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink" Target="https://example.com/page" TargetMode="External"/>
</Relationships>"#;

    #[test]
    fn test_parse_rels() {
        let rels = RelMap::parse("word/_rels/document.xml.rels", RELS).unwrap();
        assert_eq!(rels.len(), 2);
        assert_eq!(rels.target_of("rId1"), Some("media/image1.png"));
        assert!(!rels.get("rId1").unwrap().external);
        let link = rels.get("rId2").unwrap();
        assert_eq!(link.target, "https://example.com/page");
        assert!(link.external);
        assert_eq!(rels.target_of("rId9"), None);
    }

    #[test]
    fn test_entry_without_id_is_skipped() {
        let xml = br#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
            <Relationship Target="media/x.png"/>
            <Relationship Id="rId1" Target="media/y.png"/>
        </Relationships>"#;
        let rels = RelMap::parse("part.rels", xml).unwrap();
        assert_eq!(rels.len(), 1);
        assert_eq!(rels.target_of("rId1"), Some("media/y.png"));
    }

    #[test]
    fn test_rels_path_for() {
        assert_eq!(
            rels_path_for("word/document.xml"),
            "word/_rels/document.xml.rels"
        );
        assert_eq!(rels_path_for("[Content_Types].xml"), "_rels/[Content_Types].xml.rels");
    }

    #[test]
    fn test_resolve_target() {
        assert_eq!(
            resolve_target("word/document.xml", "media/image1.png"),
            "word/media/image1.png"
        );
        assert_eq!(
            resolve_target("word/document.xml", "../customXml/item1.xml"),
            "customXml/item1.xml"
        );
        assert_eq!(
            resolve_target("word/document.xml", "/word/media/image1.png"),
            "word/media/image1.png"
        );
        assert_eq!(resolve_target("document.xml", "styles.xml"), "styles.xml");
    }
}
