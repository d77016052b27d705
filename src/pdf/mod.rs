//! PDF document Info dictionary reading and writing.
//!
//! - [`read_pdf_metadata`]: Decode the trailer `Info` dictionary into a [`PdfInfo`]
//! - [`write_pdf_metadata`]: Save a copy with the Info dictionary replaced or cleared
//!
//! The PDF object model is provided by `lopdf`; this module only touches the
//! trailer, the Info dictionary, and the catalog's XMP `Metadata` reference.

mod reader;
mod writer;

pub use reader::{PdfInfo, STANDARD_KEYS, read_pdf_metadata};
pub use writer::write_pdf_metadata;

/// Strip the leading `/` that PDF name syntax puts in front of keys.
pub(crate) fn normalize_key(key: &str) -> &str {
    key.strip_prefix('/').unwrap_or(key).trim()
}
