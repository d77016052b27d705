use anyhow::{Context, Result};
use nom_exif::*;
use serde::Serialize;
use std::path::Path;

use super::tags::{self, Section, ValueKind};

/// Character-code header that prefixes a UserComment value.
const USER_COMMENT_HEADER_LEN: usize = 8;
/// EXIF ASCII date layout; nom-exif parses date tags into chrono values.
const EXIF_DATE_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// A single decoded EXIF entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExifEntry {
    pub tag: String,
    pub code: u16,
    pub value: String,
}

/// EXIF metadata extracted from a JPEG, grouped by directory.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExifData {
    /// IFD0 ("0th") entries: camera make/model, description, artist, ...
    pub image: Vec<ExifEntry>,
    /// Exif sub-IFD entries: exposure, aperture, dates, ...
    pub exif: Vec<ExifEntry>,
    /// GPS sub-IFD entries.
    pub gps: Vec<ExifEntry>,
    /// Pixel dimensions from the JPEG frame header, when decodable.
    pub dimensions: Option<(u32, u32)>,
}

impl ExifData {
    /// `true` when no EXIF entries were found in any section.
    pub fn is_empty(&self) -> bool {
        self.image.is_empty() && self.exif.is_empty() && self.gps.is_empty()
    }

    pub fn section(&self, section: Section) -> &[ExifEntry] {
        match section {
            Section::Image => &self.image,
            Section::Exif => &self.exif,
            Section::Gps => &self.gps,
        }
    }

    /// Look up a value by tag name in any section.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.image
            .iter()
            .chain(&self.exif)
            .chain(&self.gps)
            .find(|e| e.tag == name)
            .map(|e| e.value.as_str())
    }

    fn push(&mut self, section: Section, entry: ExifEntry) {
        match section {
            Section::Image => self.image.push(entry),
            Section::Exif => self.exif.push(entry),
            Section::Gps => self.gps.push(entry),
        }
    }
}

/// Read EXIF metadata from a JPEG file.
///
/// A JPEG without an EXIF block is not an error; the result is simply empty.
pub fn read_exif(path: &Path) -> Result<ExifData> {
    let mut parser = MediaParser::new();
    let ms = MediaSource::file_path(path).context("Failed to open image file")?;

    let mut data = ExifData {
        dimensions: image::image_dimensions(path).ok(),
        ..Default::default()
    };

    let iter: ExifIter = match parser.parse(ms) {
        Ok(iter) => iter,
        Err(e) => {
            log::debug!("No EXIF data found in {}: {e}", path.display());
            return Ok(data);
        }
    };

    for entry in iter {
        // IFD1 describes the embedded thumbnail
        if entry.ifd_index() != 0 {
            continue;
        }

        let code = entry.tag_code();
        let info = tags::by_code(code);
        if info.is_some_and(|t| t.kind == ValueKind::Pointer) {
            continue;
        }

        let Some(value) = entry.get_value() else {
            log::debug!("Unreadable EXIF entry 0x{code:04X}");
            continue;
        };

        let (tag, section, kind) = match info {
            Some(t) => (t.name.to_string(), t.section, Some(t.kind)),
            None => (
                entry
                    .tag()
                    .map(|t| format!("{t:?}"))
                    .unwrap_or_else(|| format!("0x{code:04X}")),
                tags::guess_section(code),
                None,
            ),
        };

        data.push(
            section,
            ExifEntry {
                tag,
                code,
                value: display_value(value, kind),
            },
        );
    }

    log::debug!(
        "Read {} IFD0, {} Exif, {} GPS entries from {}",
        data.image.len(),
        data.exif.len(),
        data.gps.len(),
        path.display()
    );

    Ok(data)
}

/// Render an entry value for display, decoding byte strings where possible.
fn display_value(value: &EntryValue, kind: Option<ValueKind>) -> String {
    match (value, kind) {
        (EntryValue::U8Array(bytes) | EntryValue::Undefined(bytes), Some(ValueKind::Xp)) => {
            decode_utf16le(bytes)
        }
        (EntryValue::Undefined(bytes), Some(ValueKind::Comment)) => {
            decode_ascii(bytes.get(USER_COMMENT_HEADER_LEN..).unwrap_or_default())
        }
        (EntryValue::Undefined(bytes), _) => decode_ascii(bytes),
        (EntryValue::Text(s), _) => clean(s),
        (EntryValue::Time(t), _) => t.format(EXIF_DATE_FORMAT).to_string(),
        (EntryValue::NaiveDateTime(t), _) => t.format(EXIF_DATE_FORMAT).to_string(),
        (EntryValue::URational(r), _) => format!("{}/{}", r.0, r.1),
        (EntryValue::IRational(r), _) => format!("{}/{}", r.0, r.1),
        (EntryValue::URationalArray(v), _) => join(v.iter().map(|r| format!("{}/{}", r.0, r.1))),
        (EntryValue::IRationalArray(v), _) => join(v.iter().map(|r| format!("{}/{}", r.0, r.1))),
        (EntryValue::U8Array(v), _) => join(v.iter()),
        (EntryValue::U16Array(v), _) => join(v.iter()),
        (EntryValue::U32Array(v), _) => join(v.iter()),
        (other, _) => clean(&other.to_string()),
    }
}

/// Comma-separated, the same form the writer accepts for multi-valued tags.
fn join<T: ToString>(items: impl Iterator<Item = T>) -> String {
    items.map(|v| v.to_string()).collect::<Vec<_>>().join(", ")
}

/// Trim padding NULs, whitespace, and stray quotes.
fn clean(s: &str) -> String {
    s.trim_matches(|c: char| c == '\0' || c.is_whitespace())
        .trim_matches('"')
        .to_string()
}

/// Decode an ASCII byte string, turning NUL padding into spaces.
fn decode_ascii(bytes: &[u8]) -> String {
    let text: String = bytes
        .iter()
        .filter(|b| b.is_ascii())
        .map(|&b| if b == 0 { ' ' } else { b as char })
        .collect();
    text.trim().to_string()
}

/// Decode a UTF-16LE byte string (XP* tags), dropping the NUL terminator.
fn decode_utf16le(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .take_while(|&u| u != 0)
        .collect();
    String::from_utf16_lossy(&units)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exif::fixtures::{write_test_jpeg, write_test_jpeg_with_gps};
    use tempfile::TempDir;

    #[test]
    fn jpeg_without_exif_is_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("plain.jpg");
        write_test_jpeg(&path);

        let data = read_exif(&path).unwrap();
        assert!(data.is_empty());
        assert_eq!(data.dimensions, Some((16, 12)));
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(read_exif(Path::new("/nonexistent/photo.jpg")).is_err());
    }

    #[test]
    fn gps_processing_method_is_decoded() {
        let raw = b"ASCII\0\0\0GPS\0\0";
        let value = EntryValue::Undefined(raw.to_vec());
        assert_eq!(display_value(&value, Some(ValueKind::Undefined)), "ASCII   GPS");
    }

    #[test]
    fn user_comment_header_is_stripped() {
        let mut raw = b"ASCII\0\0\0".to_vec();
        raw.extend_from_slice(b"Sunset over the bay");
        let value = EntryValue::Undefined(raw);
        assert_eq!(display_value(&value, Some(ValueKind::Comment)), "Sunset over the bay");
    }

    #[test]
    fn xp_values_are_utf16() {
        let mut raw: Vec<u8> = "Straße".encode_utf16().flat_map(|u| u.to_le_bytes()).collect();
        raw.extend_from_slice(&[0, 0]);
        let value = EntryValue::U8Array(raw);
        assert_eq!(display_value(&value, Some(ValueKind::Xp)), "Straße");
    }

    #[test]
    fn text_values_are_trimmed() {
        let value = EntryValue::Text("Canon\0\0 ".to_string());
        assert_eq!(display_value(&value, Some(ValueKind::Ascii)), "Canon");
    }

    #[test]
    fn dates_keep_exif_layout() {
        let naive = chrono::NaiveDate::from_ymd_opt(2025, 5, 17)
            .unwrap()
            .and_hms_opt(14, 30, 0)
            .unwrap();
        let value = EntryValue::NaiveDateTime(naive);
        assert_eq!(display_value(&value, Some(ValueKind::Ascii)), "2025:05:17 14:30:00");

        let offset = chrono::FixedOffset::east_opt(2 * 3600).unwrap();
        let value = EntryValue::Time(naive.and_local_timezone(offset).unwrap());
        assert_eq!(display_value(&value, Some(ValueKind::Ascii)), "2025:05:17 14:30:00");
    }

    #[test]
    fn rationals_and_arrays_use_writer_syntax() {
        let value = EntryValue::URational(URational::from((28, 10)));
        assert_eq!(display_value(&value, Some(ValueKind::Rational)), "28/10");

        let value = EntryValue::URationalArray(vec![URational::from((51, 1)), URational::from((30, 1))]);
        assert_eq!(display_value(&value, None), "51/1, 30/1");

        let value = EntryValue::U16Array(vec![1, 2, 3]);
        assert_eq!(display_value(&value, None), "1, 2, 3");
    }

    #[test]
    fn reads_gps_section_from_exif_block() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gps.jpg");
        write_test_jpeg_with_gps(&path);

        let data = read_exif(&path).unwrap();
        assert_eq!(data.get("Make"), Some("Cam"));
        assert_eq!(data.section(Section::Gps).len(), 2);
        assert_eq!(data.get("GPSLatitudeRef"), Some("N"));
        assert_eq!(data.get("GPSLatitude"), Some("51/1, 30/1, 0/1"));
        assert!(data.exif.is_empty());
    }

    #[test]
    fn lookup_spans_sections() {
        let data = ExifData {
            image: vec![ExifEntry { tag: "Make".into(), code: 0x010F, value: "Canon".into() }],
            gps: vec![ExifEntry { tag: "GPSMapDatum".into(), code: 0x0012, value: "WGS-84".into() }],
            ..Default::default()
        };
        assert_eq!(data.get("Make"), Some("Canon"));
        assert_eq!(data.get("GPSMapDatum"), Some("WGS-84"));
        assert_eq!(data.get("Model"), None);
        assert_eq!(data.section(Section::Gps).len(), 1);
    }
}
