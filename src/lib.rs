//! # undocx
//!
//! DOCX content extraction for Rust.
//!
//! This library opens Word documents and extracts their content into one
//! uniform shape: a list of tables, each table holding rows of cells, each
//! cell holding paragraphs of styled runs. Body text outside any table is
//! wrapped in a one-cell table, so every paragraph in a document is
//! reachable by the same four-index path.
//!
//! ## Quick Start
//!
//! ```no_run
//! use undocx::parse_file;
//!
//! fn main() -> undocx::Result<()> {
//!     let doc = parse_file("report.docx")?;
//!
//!     // All text, paragraphs separated by blank lines
//!     println!("{}", doc.text());
//!
//!     // Or walk the structure
//!     for table in &doc.body {
//!         println!("table with {} rows", table.row_count());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Uniform shape**: headers, body, footers, footnotes, and endnotes all
//!   extract to the same tables/rows/cells/paragraphs nesting
//! - **Styled runs**: optional HTML-style markers for bold, italic,
//!   headings, and the rest of the inline formatting
//! - **Run merging**: text fragmented by spell-check seams and revision
//!   history is rejoined before extraction
//! - **Numbered lists**: ascii prefixes plus structured list positions
//! - **Tables**: merged cells normalized into a rectangular grid
//! - **Side content**: comments, footnotes, images, form fields, and core
//!   properties extracted alongside the text
//! - **Parallel processing**: independent content parts extract on rayon
//!   workers

pub mod detect;
pub mod error;
mod extract;
pub mod iterators;
pub mod model;
pub mod parser;

// Re-export commonly used types
pub use detect::{is_docx, is_docx_bytes};
pub use error::{Error, Result};
pub use model::{
    Cell, Comment, CoreProperties, Document, ListPosition, Paragraph, Row, Run, Table,
};
pub use parser::{ExtractOptions, Package};

use std::io::Read;
use std::path::Path;

/// Parse a DOCX file and return the extracted document.
///
/// # Arguments
///
/// * `path` - Path to the DOCX file
///
/// # Returns
///
/// A `Result` containing the extracted `Document` or an error.
///
/// # Example
///
/// ```no_run
/// use undocx::parse_file;
///
/// let doc = parse_file("report.docx").unwrap();
/// println!("{} body tables", doc.body.len());
/// ```
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Document> {
    parse_file_with_options(path, ExtractOptions::default())
}

/// Parse a DOCX file with custom options.
///
/// # Example
///
/// ```no_run
/// use undocx::{parse_file_with_options, ExtractOptions};
///
/// let options = ExtractOptions::new().with_html(true);
/// let doc = parse_file_with_options("report.docx", options).unwrap();
/// ```
pub fn parse_file_with_options<P: AsRef<Path>>(
    path: P,
    options: ExtractOptions,
) -> Result<Document> {
    let mut package = Package::open(path)?;
    extract::extract_document(&mut package, &options)
}

/// Parse a DOCX document from bytes.
///
/// # Example
///
/// ```no_run
/// use undocx::parse_bytes;
///
/// let data = std::fs::read("report.docx").unwrap();
/// let doc = parse_bytes(&data).unwrap();
/// ```
pub fn parse_bytes(data: &[u8]) -> Result<Document> {
    parse_bytes_with_options(data, ExtractOptions::default())
}

/// Parse a DOCX document from bytes with custom options.
pub fn parse_bytes_with_options(data: &[u8], options: ExtractOptions) -> Result<Document> {
    let mut package = Package::from_bytes(data)?;
    extract::extract_document(&mut package, &options)
}

/// Parse a DOCX document from a reader.
///
/// # Example
///
/// ```no_run
/// use undocx::parse_reader;
/// use std::fs::File;
///
/// let file = File::open("report.docx").unwrap();
/// let doc = parse_reader(file).unwrap();
/// ```
pub fn parse_reader<R: Read>(reader: R) -> Result<Document> {
    parse_reader_with_options(reader, ExtractOptions::default())
}

/// Parse a DOCX document from a reader with custom options.
pub fn parse_reader_with_options<R: Read>(reader: R, options: ExtractOptions) -> Result<Document> {
    let mut package = Package::from_reader(reader)?;
    extract::extract_document(&mut package, &options)
}

/// Extract plain text from a DOCX file.
///
/// Paragraphs are separated by blank lines, in reading order across all
/// content parts.
///
/// # Example
///
/// ```no_run
/// use undocx::extract_text;
///
/// let text = extract_text("report.docx").unwrap();
/// println!("{}", text);
/// ```
pub fn extract_text<P: AsRef<Path>>(path: P) -> Result<String> {
    let doc = parse_file(path)?;
    Ok(doc.text())
}

/// Builder for extracting DOCX documents.
///
/// # Example
///
/// ```no_run
/// use undocx::Undocx;
///
/// let doc = Undocx::new()
///     .html(true)
///     .paragraph_styles(true)
///     .parse("report.docx")?;
/// println!("{}", doc.text());
/// # Ok::<(), undocx::Error>(())
/// ```
pub struct Undocx {
    options: ExtractOptions,
}

impl Undocx {
    /// Create a new builder with default options.
    pub fn new() -> Self {
        Self {
            options: ExtractOptions::default(),
        }
    }

    /// Start from preassembled options.
    pub fn with_options(options: ExtractOptions) -> Self {
        Self { options }
    }

    /// Render inline formatting as HTML-style markers.
    pub fn html(mut self, enable: bool) -> Self {
        self.options = self.options.with_html(enable);
        self
    }

    /// Insert each paragraph's style name as a leading run.
    pub fn paragraph_styles(mut self, enable: bool) -> Self {
        self.options = self.options.with_paragraph_styles(enable);
        self
    }

    /// Copy merged-cell content into covered grid positions.
    pub fn duplicate_merged_cells(mut self, enable: bool) -> Self {
        self.options = self.options.with_duplicate_merged_cells(enable);
        self
    }

    /// Fail on unreadable content parts instead of skipping them.
    pub fn strict(mut self) -> Self {
        self.options = self.options.strict();
        self
    }

    /// Disable parallel part extraction.
    pub fn sequential(mut self) -> Self {
        self.options = self.options.sequential();
        self
    }

    /// Extract a DOCX file.
    pub fn parse<P: AsRef<Path>>(self, path: P) -> Result<Document> {
        parse_file_with_options(path, self.options)
    }

    /// Extract a DOCX document from bytes.
    pub fn parse_bytes(self, data: &[u8]) -> Result<Document> {
        parse_bytes_with_options(data, self.options)
    }

    /// Extract a DOCX document from a reader.
    pub fn parse_reader<R: Read>(self, reader: R) -> Result<Document> {
        parse_reader_with_options(reader, self.options)
    }
}

impl Default for Undocx {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use zip::write::FileOptions;

    const NS: &str = "xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\"";

    fn zip_of(parts: &[(&str, &str)]) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut cursor);
            for (name, content) in parts {
                writer.start_file(*name, FileOptions::default()).unwrap();
                writer.write_all(content.as_bytes()).unwrap();
            }
            writer.finish().unwrap();
        }
        cursor.into_inner()
    }

    fn docx(document_xml: &str) -> Vec<u8> {
        zip_of(&[
            ("[Content_Types].xml", "<Types/>"),
            ("word/document.xml", document_xml),
        ])
    }

    fn body(content: &str) -> String {
        format!("<w:document {NS}><w:body>{content}</w:body></w:document>")
    }

    // ==================== Builder Pattern Tests ====================

    #[test]
    fn test_undocx_builder() {
        let undocx = Undocx::new().html(true).paragraph_styles(true).strict();
        assert!(undocx.options.html);
        assert!(undocx.options.paragraph_styles);
        assert!(undocx.options.strict);
        assert!(undocx.options.parallel);
    }

    #[test]
    fn test_undocx_builder_default() {
        let undocx = Undocx::default();
        assert!(!undocx.options.html);
        assert!(!undocx.options.paragraph_styles);
        assert!(!undocx.options.duplicate_merged_cells);
        assert!(!undocx.options.strict);
    }

    #[test]
    fn test_undocx_builder_sequential() {
        let undocx = Undocx::new().sequential();
        assert!(!undocx.options.parallel);
    }

    #[test]
    fn test_undocx_builder_chained() {
        let undocx = Undocx::new()
            .html(true)
            .duplicate_merged_cells(true)
            .sequential()
            .strict();
        assert!(undocx.options.html);
        assert!(undocx.options.duplicate_merged_cells);
        assert!(!undocx.options.parallel);
        assert!(undocx.options.strict);
    }

    #[test]
    fn test_undocx_with_options() {
        let options = ExtractOptions::new().with_html(true);
        let undocx = Undocx::with_options(options);
        assert!(undocx.options.html);
    }

    // ==================== Edge Case Tests ====================

    #[test]
    fn test_parse_bytes_empty_data() {
        let data: [u8; 0] = [];
        assert!(matches!(parse_bytes(&data), Err(Error::UnknownFormat)));
    }

    #[test]
    fn test_parse_bytes_not_zip() {
        assert!(matches!(
            parse_bytes(b"<!DOCTYPE html><html></html>"),
            Err(Error::UnknownFormat)
        ));
        assert!(matches!(
            parse_bytes(b"%PDF-1.7\n%test"),
            Err(Error::UnknownFormat)
        ));
    }

    #[test]
    fn test_parse_bytes_plain_zip() {
        let data = zip_of(&[("readme.txt", "not a docx")]);
        assert!(matches!(parse_bytes(&data), Err(Error::UnknownFormat)));
    }

    #[test]
    fn test_parse_bytes_zip_without_document() {
        let data = zip_of(&[("[Content_Types].xml", "<Types/>")]);
        assert!(matches!(parse_bytes(&data), Err(Error::MissingPart(_))));
    }

    #[test]
    fn test_strict_mode_rejects_malformed_part() {
        let data = docx(&format!(
            "<w:document {NS}><w:body></w:wrong></w:document>"
        ));
        assert!(Undocx::new().strict().parse_bytes(&data).is_err());

        // lenient mode skips the part and records the problem
        let doc = parse_bytes(&data).unwrap();
        assert!(doc.body.is_empty());
        assert!(!doc.warnings.is_empty());
    }

    // ==================== Extraction Tests ====================

    #[test]
    fn test_parse_bytes_minimal_document() {
        let doc = parse_bytes(&docx(&body("<w:p><w:r><w:t>hello</w:t></w:r></w:p>"))).unwrap();
        assert_eq!(doc.text(), "hello");
        assert_eq!(doc.body.len(), 1);
        assert!(doc.comments.is_empty());
    }

    #[test]
    fn test_parse_reader_round_trip() {
        let data = docx(&body("<w:p><w:r><w:t>from a reader</w:t></w:r></w:p>"));
        let doc = parse_reader(Cursor::new(data)).unwrap();
        assert_eq!(doc.text(), "from a reader");
    }

    #[test]
    fn test_html_mode_wraps_formatting() {
        let data = docx(&body(
            "<w:p><w:pPr><w:pStyle w:val=\"Heading1\"/></w:pPr>\
             <w:r><w:rPr><w:b/></w:rPr><w:t>Title</w:t></w:r></w:p>",
        ));
        let doc = Undocx::new().html(true).parse_bytes(&data).unwrap();
        assert_eq!(doc.text(), "<h1><b>Title</b></h1>");

        let plain = parse_bytes(&data).unwrap();
        assert_eq!(plain.text(), "Title");
    }

    #[test]
    fn test_split_runs_rejoined() {
        let data = docx(&body(
            "<w:p><w:r><w:t>work to im</w:t></w:r>\
             <w:proofErr w:type=\"spellStart\"/>\
             <w:r><w:t>prove</w:t></w:r></w:p>",
        ));
        let doc = parse_bytes(&data).unwrap();
        let par = &doc.body[0].rows[0].cells[0].paragraphs[0];
        assert_eq!(par.run_strings(), ["work to improve"]);
    }
}
