//! List numbering: live counters per list and rendered item prefixes.

use std::collections::{BTreeMap, HashMap};

use crate::extract::Warnings;
use crate::model::ListPosition;
use crate::parser::NumberingDefs;

const BULLET: &str = "--";

/// One numbered (or bulleted) paragraph's worth of list information.
pub(crate) struct ListItem {
    /// Rendered prefix: one tab per nesting level, the symbol, `)` after
    /// numbered symbols, then a separating tab.
    pub prefix: String,
    /// Zero-based position within the list, one ordinal per level.
    pub position: ListPosition,
}

/// Counter state for every list encountered while walking one part.
///
/// A tracker lives for exactly one part walk, so numbering restarts with each
/// header, footer, and note stream the same way it restarts on screen.
pub(crate) struct ListTracker<'a> {
    defs: &'a NumberingDefs,
    /// numId -> ilvl -> current counter value.
    counters: HashMap<String, BTreeMap<u32, u32>>,
}

impl<'a> ListTracker<'a> {
    pub fn new(defs: &'a NumberingDefs) -> Self {
        Self {
            defs,
            counters: HashMap::new(),
        }
    }

    /// Advance the counter for a `(numId, ilvl)` reference and render it.
    ///
    /// Entering a level resets every deeper level, so a list that returns to
    /// level 0 starts its next sub-list fresh. A numId with no definition in
    /// the numbering part is not a list item at all; a defined list with a
    /// missing level or an unsupported format degrades to a plain bullet.
    pub fn item(&mut self, num_id: &str, ilvl: u32, warnings: &mut Warnings) -> Option<ListItem> {
        if !self.defs.defines(num_id) {
            warnings.push(format!(
                "paragraph references undefined list numId {num_id}"
            ));
            return None;
        }
        let defs = self.defs;
        let level = defs.level(num_id, ilvl);
        if level.is_none() {
            warnings.push(format!(
                "list {num_id} declares no level {ilvl}, using bullet"
            ));
        }

        let counters = self.counters.entry(num_id.to_owned()).or_default();
        counters.retain(|&lvl, _| lvl <= ilvl);
        let start = level.map_or(1, |l| l.start);
        let number = *counters.entry(ilvl).and_modify(|c| *c += 1).or_insert(start);

        let path: Vec<u32> = (0..=ilvl)
            .map(|lvl| {
                let lvl_start = defs.level(num_id, lvl).map_or(1, |l| l.start);
                counters.get(&lvl).map_or(0, |&c| c.saturating_sub(lvl_start))
            })
            .collect();

        let (symbol, numbered) = match level.map(|l| l.num_fmt.as_str()) {
            None | Some("bullet") => (BULLET.to_owned(), false),
            Some("decimal") => (number.to_string(), true),
            Some("lowerLetter") => (lower_letter(number), true),
            Some("upperLetter") => (lower_letter(number).to_uppercase(), true),
            Some("lowerRoman") => (lower_roman(number), true),
            Some("upperRoman") => (lower_roman(number).to_uppercase(), true),
            Some(other) => {
                warnings.push(format!(
                    "unsupported numbering format {other:?} in list {num_id}, using bullet"
                ));
                (BULLET.to_owned(), false)
            }
        };

        let mut prefix = "\t".repeat(ilvl as usize);
        prefix.push_str(&symbol);
        if numbered {
            prefix.push(')');
        }
        prefix.push('\t');

        Some(ListItem {
            prefix,
            position: ListPosition::new(num_id, path),
        })
    }
}

/// Spreadsheet-style letter numbering: 1 -> a, 26 -> z, 27 -> aa.
fn lower_letter(n: u32) -> String {
    let mut n = n;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        n = (n - 1) / 26;
        letters.push((b'a' + rem as u8) as char);
    }
    letters.iter().rev().collect()
}

/// Tally-and-substitute roman numerals. Group substitutions must run before
/// the subtractive ones so `iiii` only becomes `iv` once no `v` can be made
/// from it.
const ROMAN_SUBS: [(&str, &str); 12] = [
    ("iiiii", "v"),
    ("vv", "x"),
    ("xxxxx", "l"),
    ("ll", "c"),
    ("ccccc", "d"),
    ("dd", "m"),
    ("iiii", "iv"),
    ("viv", "ix"),
    ("xxxx", "xl"),
    ("lxl", "xc"),
    ("cccc", "cd"),
    ("dcd", "cm"),
];

fn lower_roman(n: u32) -> String {
    let mut numeral = "i".repeat(n as usize);
    for (pattern, replacement) in ROMAN_SUBS {
        numeral = numeral.replace(pattern, replacement);
    }
    numeral
}
