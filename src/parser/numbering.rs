//! Parsing `word/numbering.xml` list definitions.
//!
//! A paragraph's `w:numPr` names a `numId` and an indentation level. The
//! numbering part maps `numId` to an abstract definition which declares, per
//! level, the number format and the starting value. Counter state and the
//! rendering of counters into list markers live in the extraction engine;
//! this module only answers "what format is (numId, ilvl)?".

use std::collections::HashMap;

use crate::extract::roles::{get_attr, AttrScope};
use crate::parser::xml::XmlTree;
use crate::Result;

/// Format and start value declared for one list level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelDef {
    /// `w:numFmt` value, e.g. `decimal`, `lowerLetter`, `bullet`.
    pub num_fmt: String,
    /// `w:start` value; 1 when absent.
    pub start: u32,
}

/// All list definitions of a document.
///
/// Documents without a numbering part get [`NumberingDefs::empty`]; every
/// lookup then misses and list paragraphs fall back to bullets.
#[derive(Debug, Clone, Default)]
pub struct NumberingDefs {
    /// abstractNumId -> ilvl -> definition.
    abstracts: HashMap<String, HashMap<u32, LevelDef>>,
    /// numId -> abstractNumId.
    num_to_abstract: HashMap<String, String>,
}

impl NumberingDefs {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn parse(part: &str, data: &[u8]) -> Result<Self> {
        let tree = XmlTree::parse(data, part)?;
        let mut defs = Self::default();
        for &child in tree.children(tree.root()) {
            match tree.local(child) {
                "abstractNum" => {
                    let Some(id) = get_attr(&tree, child, AttrScope::Main, "abstractNumId") else {
                        continue;
                    };
                    let mut levels = HashMap::new();
                    for &lvl in tree.children(child) {
                        if tree.local(lvl) != "lvl" {
                            continue;
                        }
                        let Some(ilvl) = get_attr(&tree, lvl, AttrScope::Main, "ilvl")
                            .and_then(|v| v.parse::<u32>().ok())
                        else {
                            log::warn!("{}: lvl without a numeric ilvl, skipped", part);
                            continue;
                        };
                        levels.insert(ilvl, Self::read_level(&tree, lvl));
                    }
                    defs.abstracts.insert(id.to_owned(), levels);
                }
                "num" => {
                    let Some(num_id) = get_attr(&tree, child, AttrScope::Main, "numId") else {
                        continue;
                    };
                    let abstract_id = tree
                        .find_child(child, "abstractNumId")
                        .and_then(|c| get_attr(&tree, c, AttrScope::Main, "val"));
                    if let Some(abstract_id) = abstract_id {
                        defs.num_to_abstract
                            .insert(num_id.to_owned(), abstract_id.to_owned());
                    }
                }
                _ => {}
            }
        }
        Ok(defs)
    }

    fn read_level(tree: &XmlTree, lvl: crate::parser::xml::NodeId) -> LevelDef {
        let mut num_fmt = String::new();
        let mut start = 1u32;
        for &child in tree.children(lvl) {
            match tree.local(child) {
                "numFmt" => {
                    if let Some(v) = get_attr(tree, child, AttrScope::Main, "val") {
                        num_fmt = v.to_owned();
                    }
                }
                "start" => {
                    if let Some(v) = get_attr(tree, child, AttrScope::Main, "val") {
                        if let Ok(v) = v.parse::<u32>() {
                            start = v;
                        }
                    }
                }
                _ => {}
            }
        }
        LevelDef { num_fmt, start }
    }

    /// Whether the document declares this numId at all.
    pub fn defines(&self, num_id: &str) -> bool {
        self.num_to_abstract.contains_key(num_id)
    }

    /// Definition for a (numId, ilvl) pair, if the document declares one.
    pub fn level(&self, num_id: &str, ilvl: u32) -> Option<&LevelDef> {
        let abstract_id = self.num_to_abstract.get(num_id)?;
        self.abstracts.get(abstract_id)?.get(&ilvl)
    }

    pub fn is_empty(&self) -> bool {
        self.num_to_abstract.is_empty()
    }
}
