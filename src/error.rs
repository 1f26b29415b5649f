//! Error types for undocx library.

use std::io;
use thiserror::Error;

/// Result type alias for undocx operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while reading a DOCX package.
///
/// Content-level problems (unrecognized elements, dangling relationship ids,
/// unresolvable numbering formats, malformed form entries) are never errors;
/// they are skipped with a warning and extraction continues. Only package- and
/// XML-level failures surface here.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file format is not recognized as DOCX.
    #[error("Unknown file format: not a valid DOCX package")]
    UnknownFormat,

    /// The zip archive could not be read or written.
    #[error("Package error: {0}")]
    Package(String),

    /// An XML part could not be parsed.
    #[error("XML parsing error in {part}: {message}")]
    XmlParse {
        /// Archive path of the offending part.
        part: String,
        /// Underlying parser message.
        message: String,
    },

    /// A required package part is missing.
    #[error("Missing package part: {0}")]
    MissingPart(String),

    /// Error serializing a document tree back to XML.
    #[error("XML write error: {0}")]
    XmlWrite(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(e) => Error::Io(e),
            zip::result::ZipError::FileNotFound => {
                Error::MissingPart("file not found in archive".to_string())
            }
            _ => Error::Package(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::UnknownFormat;
        assert_eq!(
            err.to_string(),
            "Unknown file format: not a valid DOCX package"
        );

        let err = Error::XmlParse {
            part: "word/document.xml".to_string(),
            message: "unexpected end of file".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "XML parsing error in word/document.xml: unexpected end of file"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_missing_part_display() {
        let err = Error::MissingPart("word/document.xml".to_string());
        assert_eq!(err.to_string(), "Missing package part: word/document.xml");
    }
}
