//! Extraction options and configuration.

/// Options for extracting DOCX documents.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Render inline formatting as HTML-style markers and escape `&<>` in
    /// run text. Off by default: plain text extraction.
    pub html: bool,

    /// Insert each paragraph's style name as a leading pseudo-run, so
    /// consumers can see `Heading1` etc. without walking styles themselves.
    pub paragraph_styles: bool,

    /// When normalizing merged table cells, copy the originating cell's
    /// content into the covered grid positions instead of leaving them empty.
    pub duplicate_merged_cells: bool,

    /// Fail on content parts whose XML cannot be parsed instead of skipping
    /// them with a warning. Element-level anomalies stay warnings either way.
    pub strict: bool,

    /// Whether to extract independent content parts (headers, body,
    /// footnotes, ...) in parallel.
    pub parallel: bool,
}

impl ExtractOptions {
    /// Create new extract options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable HTML-style formatting markers.
    pub fn with_html(mut self, html: bool) -> Self {
        self.html = html;
        self
    }

    /// Enable or disable leading paragraph-style runs.
    pub fn with_paragraph_styles(mut self, styles: bool) -> Self {
        self.paragraph_styles = styles;
        self
    }

    /// Enable or disable duplicate filling of merged cells.
    pub fn with_duplicate_merged_cells(mut self, duplicate: bool) -> Self {
        self.duplicate_merged_cells = duplicate;
        self
    }

    /// Fail on unparseable content parts.
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    /// Enable or disable parallel part extraction.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Disable parallel part extraction.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            html: false,
            paragraph_styles: false,
            duplicate_merged_cells: false,
            strict: false,
            parallel: true,
        }
    }
}
