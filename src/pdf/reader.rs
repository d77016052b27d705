use anyhow::{Context, Result};
use lopdf::{Dictionary, Document, Object};
use serde::Serialize;
use std::path::Path;

use super::normalize_key;
use crate::metadata::MetadataMap;

/// Info dictionary keys shown by default, with a human-readable label.
pub const STANDARD_KEYS: &[(&str, &str)] = &[
    ("Title", "Title"),
    ("Author", "Author"),
    ("Subject", "Subject"),
    ("CreationDate", "Created"),
    ("ModDate", "Modified"),
    ("Creator", "Creator Application"),
    ("Producer", "PDF Producer"),
];

const UTF16BE_BOM: &[u8] = &[0xFE, 0xFF];

/// Metadata extracted from a PDF document.
///
/// `entries` holds every Info dictionary key (without the leading `/`) in
/// file order, including non-standard keys.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PdfInfo {
    pub version: String,
    pub page_count: usize,
    pub encrypted: bool,
    pub entries: MetadataMap,
}

impl PdfInfo {
    /// Look up an Info value; `"/Title"` and `"Title"` are equivalent.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(normalize_key(key))
    }

    pub fn title(&self) -> Option<&str> {
        self.get("Title")
    }

    pub fn author(&self) -> Option<&str> {
        self.get("Author")
    }

    /// Entries outside [`STANDARD_KEYS`], in file order.
    pub fn custom_entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .filter(|(k, _)| !STANDARD_KEYS.iter().any(|(std_key, _)| std_key == k))
    }
}

/// Read the Info dictionary of a PDF file.
///
/// A document without an Info dictionary is not an error; the returned
/// [`PdfInfo`] simply has no entries.
pub fn read_pdf_metadata(path: &Path) -> Result<PdfInfo> {
    let doc = Document::load(path)
        .with_context(|| format!("Failed to load PDF {}", path.display()))?;

    let mut info = PdfInfo {
        version: doc.version.clone(),
        page_count: doc.get_pages().len(),
        encrypted: doc.is_encrypted(),
        entries: MetadataMap::new(),
    };

    match info_dictionary(&doc) {
        Some(dict) => {
            for (key, value) in dict.iter() {
                let key = String::from_utf8_lossy(key).into_owned();
                let value = resolve(&doc, value);
                info.entries.insert(key, object_to_string(value));
            }
            log::debug!("Read {} Info entries from {}", info.entries.len(), path.display());
        }
        None => log::debug!("No Info dictionary in {}", path.display()),
    }

    Ok(info)
}

/// Find the trailer's Info dictionary, whether indirect or inline.
fn info_dictionary(doc: &Document) -> Option<&Dictionary> {
    match doc.trailer.get(b"Info").ok()? {
        Object::Reference(id) => doc.get_dictionary(*id).ok(),
        Object::Dictionary(dict) => Some(dict),
        _ => None,
    }
}

/// Follow an indirect reference one level.
fn resolve<'a>(doc: &'a Document, object: &'a Object) -> &'a Object {
    match object {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(object),
        _ => object,
    }
}

/// Render an Info value as text.
fn object_to_string(object: &Object) -> String {
    match object {
        Object::String(bytes, _) => decode_text_string(bytes),
        Object::Name(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        Object::Integer(i) => i.to_string(),
        Object::Real(f) => f.to_string(),
        Object::Boolean(b) => b.to_string(),
        Object::Null => "null".to_string(),
        other => format!("<{}>", other.enum_variant()),
    }
}

/// Decode a PDF text string: UTF-16BE when it starts with a BOM, otherwise
/// UTF-8 if valid, otherwise one char per byte.
fn decode_text_string(bytes: &[u8]) -> String {
    if let Some(utf16) = bytes.strip_prefix(UTF16BE_BOM) {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }

    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}
