//! Document-level types.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Paragraph, Table};
use crate::error::{Error, Result};

/// An extracted DOCX document.
///
/// Content is grouped per package part category, each a sequence of tables
/// exactly four levels deep (table -> row -> cell -> paragraph). Body text
/// outside any source table arrives wrapped in single-cell pseudo-tables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    /// Content of all header parts, in part order
    pub headers: Vec<Table>,

    /// Content of the main document body
    pub body: Vec<Table>,

    /// Content of all footer parts, in part order
    pub footers: Vec<Table>,

    /// Footnote bodies
    pub footnotes: Vec<Table>,

    /// Endnote bodies
    pub endnotes: Vec<Table>,

    /// Extracted comment records
    pub comments: Vec<Comment>,

    /// Core document properties; absent when the package carries none
    pub core_properties: Option<CoreProperties>,

    /// Embedded media binaries, keyed by file name
    pub images: HashMap<String, Vec<u8>>,

    /// Warnings recorded during extraction (skipped elements, numbering
    /// fallbacks, dangling relationships)
    pub warnings: Vec<String>,
}

impl Document {
    /// Create a new empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// All content tables in reading order: headers, body, footers,
    /// footnotes, endnotes.
    pub fn document(&self) -> Vec<&Table> {
        self.headers
            .iter()
            .chain(self.body.iter())
            .chain(self.footers.iter())
            .chain(self.footnotes.iter())
            .chain(self.endnotes.iter())
            .collect()
    }

    /// Every paragraph of every part, in reading order.
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.document()
            .into_iter()
            .flat_map(|t| t.rows.iter())
            .flat_map(|r| r.cells.iter())
            .flat_map(|c| c.paragraphs.iter())
    }

    /// Full text of the document, paragraphs joined with blank lines.
    pub fn text(&self) -> String {
        self.paragraphs()
            .map(|p| p.text())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Paragraph texts of every part as nested tables -> rows -> cells ->
    /// paragraphs.
    pub fn document_text(&self) -> Vec<Vec<Vec<Vec<String>>>> {
        self.document().into_iter().map(Table::text).collect()
    }

    /// Run texts of every part, one level deeper than [`document_text`].
    ///
    /// [`document_text`]: Document::document_text
    pub fn document_runs(&self) -> Vec<Vec<Vec<Vec<Vec<String>>>>> {
        self.document().into_iter().map(Table::run_strings).collect()
    }

    /// An HTML table per content table, each run labeled with its index
    /// tuple. A debugging aid for locating content by index.
    pub fn html_map(&self) -> String {
        let mut out = String::from("<html><body>\n");
        for (t, table) in self.document().into_iter().enumerate() {
            out.push_str("<table border=\"1\">\n");
            for (r, row) in table.rows.iter().enumerate() {
                out.push_str("<tr>\n");
                for (c, cell) in row.cells.iter().enumerate() {
                    out.push_str("<td><pre>");
                    for (p, par) in cell.paragraphs.iter().enumerate() {
                        for (n, run) in par.runs.iter().enumerate() {
                            out.push_str(&format!(
                                "({}, {}, {}, {}, {}) {:?}\n",
                                t, r, c, p, n, run.text
                            ));
                        }
                    }
                    out.push_str("</pre></td>\n");
                }
                out.push_str("</tr>\n");
            }
            out.push_str("</table>\n");
        }
        out.push_str("</body></html>\n");
        out
    }

    /// Serialize the whole document to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Other(e.to_string()))
    }

    /// Get one embedded image by file name.
    pub fn image(&self, name: &str) -> Option<&[u8]> {
        self.images.get(name).map(|v| v.as_slice())
    }

    /// Write all embedded images into a directory, returning the paths
    /// written. The directory is created if needed.
    pub fn save_images(&self, dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let mut written = Vec::with_capacity(self.images.len());
        let mut names: Vec<&String> = self.images.keys().collect();
        names.sort();
        for name in names {
            let path = dir.join(name);
            fs::write(&path, &self.images[name])?;
            written.push(path);
        }
        Ok(written)
    }
}

/// One extracted comment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Comment {
    /// The body text the comment range covers
    pub reference: String,

    /// Comment author
    pub author: String,

    /// Comment date as written in the source
    pub date: String,

    /// The comment's own text
    pub text: String,
}

/// Core document properties from `docProps/core.xml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoreProperties {
    /// Document title
    pub title: Option<String>,

    /// Document subject
    pub subject: Option<String>,

    /// Original author
    pub creator: Option<String>,

    /// Keywords
    pub keywords: Option<String>,

    /// Document description
    pub description: Option<String>,

    /// Last editor
    pub last_modified_by: Option<String>,

    /// Revision marker
    pub revision: Option<String>,

    /// Creation timestamp
    pub created: Option<DateTime<Utc>>,

    /// Last modification timestamp
    pub modified: Option<DateTime<Utc>>,

    /// Any other properties the part declares, by local tag name
    pub extra: HashMap<String, String>,
}
