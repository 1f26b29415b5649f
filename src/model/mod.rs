//! Document model types for extracted DOCX content.
//!
//! This module defines the fixed-depth representation the extraction engine
//! emits: every document is a sequence of tables, every table is rows of
//! cells, every cell holds paragraphs, and every paragraph holds styled runs.
//! The model is source-agnostic; nothing in it refers back to markup except
//! the opaque per-paragraph source handle.

mod document;
mod paragraph;
mod table;

pub use document::{Comment, CoreProperties, Document};
pub use paragraph::{ListPosition, Paragraph, Run};
pub use table::{Cell, Row, Table};
