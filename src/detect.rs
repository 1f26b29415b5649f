//! DOCX format detection and validation.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::{Cursor, Read, Seek};
use std::path::Path;

/// Zip local-file-header magic: PK\x03\x04
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// The part every OOXML package must carry.
pub const CONTENT_TYPES_PART: &str = "[Content_Types].xml";

/// Check whether the data begins with a zip local-file header.
///
/// This is the cheap pre-check; a zip file is not necessarily a DOCX
/// package. Use [`is_docx_bytes`] for the full test.
pub fn has_zip_magic(data: &[u8]) -> bool {
    data.starts_with(ZIP_MAGIC)
}

/// Confirm that a readable archive is an OOXML package.
///
/// # Arguments
/// * `reader` - Seekable reader over the candidate archive
///
/// # Returns
/// * `Ok(())` if the archive opens and contains `[Content_Types].xml`
/// * `Err(Error::UnknownFormat)` otherwise
pub fn ensure_docx_reader<R: Read + Seek>(reader: R) -> Result<()> {
    let mut archive = zip::ZipArchive::new(reader).map_err(|_| Error::UnknownFormat)?;
    if archive.by_name(CONTENT_TYPES_PART).is_err() {
        return Err(Error::UnknownFormat);
    }
    Ok(())
}

/// Check if a file is a valid DOCX package.
///
/// # Example
/// ```no_run
/// use undocx::detect::is_docx;
///
/// if is_docx("report.docx") {
///     println!("looks like a DOCX package");
/// }
/// ```
pub fn is_docx<P: AsRef<Path>>(path: P) -> bool {
    let Ok(file) = File::open(path) else {
        return false;
    };
    ensure_docx_reader(file).is_ok()
}

/// Check if bytes represent a valid DOCX package.
pub fn is_docx_bytes(data: &[u8]) -> bool {
    if !has_zip_magic(data) {
        return false;
    }
    ensure_docx_reader(Cursor::new(data)).is_ok()
}
