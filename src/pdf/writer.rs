use anyhow::{Context, Result, bail};
use chrono::Local;
use lopdf::{Dictionary, Document, Object, StringFormat};
use std::path::Path;

use super::normalize_key;
use crate::config::PdfOptions;
use crate::metadata::{MetadataMap, WriteResult};

/// Write or clear the Info dictionary of a PDF, saving the result to `output`.
///
/// - `metadata == None` removes the Info dictionary and the catalog's XMP
///   `Metadata` stream reference.
/// - `metadata == Some(map)` replaces the Info dictionary with one holding
///   exactly the given entries. Keys may be written as `/Title` or `Title`.
///
/// The input file is read completely before `output` is written, so `output`
/// may be the input path itself.
pub fn write_pdf_metadata(
    input: &Path,
    output: &Path,
    metadata: Option<&MetadataMap>,
    options: &PdfOptions,
) -> Result<WriteResult> {
    let mut doc = Document::load(input)
        .with_context(|| format!("Failed to load PDF {}", input.display()))?;

    if doc.is_encrypted() {
        bail!("{} is encrypted; refusing to rewrite its metadata", input.display());
    }

    let mut result = WriteResult {
        output_path: output.to_path_buf(),
        ..Default::default()
    };

    match metadata {
        None => {
            clear_info(&mut doc);
            result.cleared = true;
        }
        Some(map) => {
            let info = build_info(map, options, &mut result);
            let info_id = doc.add_object(info);
            doc.trailer.set("Info", Object::Reference(info_id));
        }
    }

    let pruned = doc.prune_objects();
    if !pruned.is_empty() {
        log::debug!("Pruned {} unreferenced objects", pruned.len());
    }

    doc.save(output)
        .with_context(|| format!("Failed to save PDF to {}", output.display()))?;
    log::debug!("Saved PDF to {}", output.display());

    Ok(result)
}

/// Drop the Info dictionary and the XMP metadata stream reference.
fn clear_info(doc: &mut Document) {
    if doc.trailer.remove(b"Info").is_some() {
        log::debug!("Removed Info dictionary");
    }

    match doc.catalog_mut() {
        Ok(catalog) => {
            if catalog.remove(b"Metadata").is_some() {
                log::debug!("Removed XMP metadata stream reference");
            }
        }
        Err(e) => log::debug!("No catalog to strip XMP from: {e}"),
    }
}

/// Build a fresh Info dictionary from the given entries.
fn build_info(map: &MetadataMap, options: &PdfOptions, result: &mut WriteResult) -> Dictionary {
    let mut info = Dictionary::new();

    for (key, value) in map.iter() {
        let name = normalize_key(key);
        if name.is_empty() || name.contains(char::is_whitespace) {
            result.skip(key, "not a valid PDF name");
            continue;
        }
        info.set(name, encode_text_string(value));
        result.written.push(name.to_string());
        log::debug!("  /{name} = {value}");
    }

    if options.stamp_mod_date && !info.has(b"ModDate") {
        let stamp = pdf_date_now();
        log::debug!("  /ModDate = {stamp} (stamped)");
        info.set("ModDate", Object::string_literal(stamp));
        result.written.push("ModDate".to_string());
    }

    info
}

/// Encode text as a PDF string: literal for ASCII, UTF-16BE with BOM otherwise.
fn encode_text_string(value: &str) -> Object {
    if value.is_ascii() {
        return Object::string_literal(value);
    }

    let mut bytes = vec![0xFE, 0xFF];
    bytes.extend(value.encode_utf16().flat_map(|unit| unit.to_be_bytes()));
    Object::String(bytes, StringFormat::Hexadecimal)
}

/// Current local time as a PDF date string, e.g. `D:20250517093000+02'00'`.
fn pdf_date_now() -> String {
    let now = Local::now();
    let offset = now.offset().local_minus_utc();
    let sign = if offset >= 0 { '+' } else { '-' };
    let offset = offset.abs();
    format!(
        "D:{}{sign}{:02}'{:02}'",
        now.format("%Y%m%d%H%M%S"),
        offset / 3600,
        (offset % 3600) / 60
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::parse_metadata_string;
    use crate::pdf::fixtures::write_test_pdf;
    use crate::pdf::read_pdf_metadata;
    use lopdf::dictionary;
    use tempfile::TempDir;

    fn pdf_with_info(dir: &TempDir) -> std::path::PathBuf {
        let path = dir.path().join("input.pdf");
        write_test_pdf(
            &path,
            Some(dictionary! {
                "Title" => Object::string_literal("Old Title"),
                "Producer" => Object::string_literal("Old Producer"),
            }),
        );
        path
    }

    #[test]
    fn writes_entries_to_output_copy() {
        let dir = TempDir::new().unwrap();
        let input = pdf_with_info(&dir);
        let output = dir.path().join("modMeta.pdf");
        let original = std::fs::read(&input).unwrap();

        let meta = parse_metadata_string("/Title=Test;/Author=Zorro;/CreationDate=D:20250517120000");
        let result = write_pdf_metadata(&input, &output, Some(&meta), &PdfOptions::default()).unwrap();

        assert!(!result.cleared);
        assert_eq!(result.written, vec!["Title", "Author", "CreationDate"]);
        assert!(result.skipped.is_empty());
        assert_eq!(result.output_path, output);

        let info = read_pdf_metadata(&output).unwrap();
        assert_eq!(info.title(), Some("Test"));
        assert_eq!(info.author(), Some("Zorro"));
        assert_eq!(info.get("CreationDate"), Some("D:20250517120000"));
        assert_eq!(info.page_count, 1);

        // Input left untouched
        assert_eq!(std::fs::read(&input).unwrap(), original);
    }

    #[test]
    fn write_replaces_previous_info() {
        let dir = TempDir::new().unwrap();
        let input = pdf_with_info(&dir);
        let output = dir.path().join("out.pdf");

        let meta = parse_metadata_string("Author=Max");
        write_pdf_metadata(&input, &output, Some(&meta), &PdfOptions::default()).unwrap();

        let info = read_pdf_metadata(&output).unwrap();
        assert_eq!(info.author(), Some("Max"));
        assert_eq!(info.title(), None);
        assert_eq!(info.get("Producer"), None);
    }

    #[test]
    fn clear_removes_info() {
        let dir = TempDir::new().unwrap();
        let input = pdf_with_info(&dir);
        let output = dir.path().join("cleared.pdf");

        let result = write_pdf_metadata(&input, &output, None, &PdfOptions::default()).unwrap();
        assert!(result.cleared);
        assert!(result.written.is_empty());

        let info = read_pdf_metadata(&output).unwrap();
        assert!(info.entries.is_empty());
        assert_eq!(info.page_count, 1);
    }

    #[test]
    fn non_ascii_values_round_trip() {
        let dir = TempDir::new().unwrap();
        let input = pdf_with_info(&dir);
        let output = dir.path().join("out.pdf");

        let meta = parse_metadata_string("/Title=Ärger über Öl;/Author=José");
        write_pdf_metadata(&input, &output, Some(&meta), &PdfOptions::default()).unwrap();

        let info = read_pdf_metadata(&output).unwrap();
        assert_eq!(info.title(), Some("Ärger über Öl"));
        assert_eq!(info.author(), Some("José"));
    }

    #[test]
    fn stamps_mod_date_when_enabled() {
        let dir = TempDir::new().unwrap();
        let input = pdf_with_info(&dir);
        let output = dir.path().join("out.pdf");
        let options = PdfOptions { stamp_mod_date: true };

        let meta = parse_metadata_string("/Title=Stamped");
        let result = write_pdf_metadata(&input, &output, Some(&meta), &options).unwrap();
        assert!(result.written.contains(&"ModDate".to_string()));

        let info = read_pdf_metadata(&output).unwrap();
        assert!(info.get("ModDate").unwrap().starts_with("D:"));
    }

    #[test]
    fn explicit_mod_date_is_not_overridden() {
        let dir = TempDir::new().unwrap();
        let input = pdf_with_info(&dir);
        let output = dir.path().join("out.pdf");
        let options = PdfOptions { stamp_mod_date: true };

        let meta = parse_metadata_string("/ModDate=D:20200101000000");
        write_pdf_metadata(&input, &output, Some(&meta), &options).unwrap();

        let info = read_pdf_metadata(&output).unwrap();
        assert_eq!(info.get("ModDate"), Some("D:20200101000000"));
    }

    #[test]
    fn invalid_names_are_skipped() {
        let dir = TempDir::new().unwrap();
        let input = pdf_with_info(&dir);
        let output = dir.path().join("out.pdf");

        let meta = parse_metadata_string("/=nothing;My Key=spaced;/Title=Kept");
        let result = write_pdf_metadata(&input, &output, Some(&meta), &PdfOptions::default()).unwrap();

        assert_eq!(result.written, vec!["Title"]);
        let skipped: Vec<_> = result.skipped.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(skipped, vec!["/", "My Key"]);
    }

    #[test]
    fn output_may_overwrite_input() {
        let dir = TempDir::new().unwrap();
        let input = pdf_with_info(&dir);

        let meta = parse_metadata_string("/Title=In Place");
        write_pdf_metadata(&input, &input, Some(&meta), &PdfOptions::default()).unwrap();

        let info = read_pdf_metadata(&input).unwrap();
        assert_eq!(info.title(), Some("In Place"));
    }

    #[test]
    fn missing_input_is_an_error() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("out.pdf");
        let result = write_pdf_metadata(
            Path::new("/nonexistent/input.pdf"),
            &output,
            None,
            &PdfOptions::default(),
        );
        assert!(result.is_err());
        assert!(!output.exists());
    }

    #[test]
    fn pdf_date_has_expected_shape() {
        let stamp = pdf_date_now();
        assert!(stamp.starts_with("D:"));
        assert_eq!(stamp.len(), "D:20250517093000+02'00'".len());
        assert!(stamp.ends_with('\''));
    }
}
