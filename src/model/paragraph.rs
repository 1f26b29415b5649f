//! Paragraph-level types: styled runs and list positions.

use serde::{Deserialize, Serialize};

use crate::parser::xml::NodeId;

/// A contiguous span of text sharing one formatting signature.
///
/// In HTML mode the text already carries its share of the paragraph's
/// formatting markers, so joining a paragraph's run texts yields balanced
/// markup; in plain mode it is the raw text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run {
    /// Formatting markers in canonical order, e.g.
    /// `["span style=\"font-size:24pt\"", "b", "i"]`
    pub style: Vec<String>,

    /// Text content, including placeholder tokens for breaks, images,
    /// note references, and form values
    pub text: String,
}

impl Run {
    /// Create a new run.
    pub fn new(style: Vec<String>, text: impl Into<String>) -> Self {
        Self {
            style,
            text: text.into(),
        }
    }

    /// Create an unstyled run.
    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(Vec::new(), text)
    }

    /// Check if this run carries no text.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Structured address of a paragraph within a numbered or bulleted list.
///
/// `path` holds one zero-based ordinal per indentation level, so the third
/// top-level item of list `"5"` is `("5", [2])` and its first sub-item
/// `("5", [2, 0])`, independent of how the ascii prefix is rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListPosition {
    /// Opaque list-definition id from the source document
    pub list_id: String,

    /// Zero-based index per level, outermost first
    pub path: Vec<u32>,
}

impl ListPosition {
    /// Create a new list position.
    pub fn new(list_id: impl Into<String>, path: Vec<u32>) -> Self {
        Self {
            list_id: list_id.into(),
            path,
        }
    }

    /// Indentation level of the addressed paragraph (0 = top level).
    pub fn level(&self) -> usize {
        self.path.len().saturating_sub(1)
    }
}

/// The unit of text at the fixed output depth: an ordered run sequence.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Paragraph {
    /// Resolved paragraph style name (`Heading1`, ...), if any
    pub style: Option<String>,

    /// Runs in reading order. Concatenated, they reproduce the paragraph's
    /// full text exactly once.
    pub runs: Vec<Run>,

    /// List address when the paragraph is part of a numbered/bulleted list
    pub list_position: Option<ListPosition>,

    /// Handle of the source element inside its part tree, for callers that
    /// edit source text in place. Not serialized.
    #[serde(skip)]
    pub source: Option<NodeId>,
}

impl Paragraph {
    /// Create a new empty paragraph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a paragraph holding one plain run.
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            runs: vec![Run::plain(text)],
            ..Self::default()
        }
    }

    /// Full text of the paragraph: run texts joined.
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }

    /// Run texts as separate strings.
    pub fn run_strings(&self) -> Vec<String> {
        self.runs.iter().map(|r| r.text.clone()).collect()
    }

    /// Check if the paragraph carries no text at all.
    pub fn is_empty(&self) -> bool {
        self.runs.iter().all(Run::is_empty)
    }

    /// Check if this paragraph is a list item.
    pub fn is_list_item(&self) -> bool {
        self.list_position.is_some()
    }
}
