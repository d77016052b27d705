use anyhow::{Result, bail};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::exif::{self, ExifData};
use crate::metadata::{MetadataMap, WriteResult};
use crate::pdf::{self, PdfInfo};

/// The kind of file being processed, determined by its extension.
///
/// Use [`FileKind::from_path`] to detect the kind from a path.
///
/// # Example
///
/// ```rust
/// use meta_tool::pipeline::FileKind;
/// use std::path::Path;
///
/// assert_eq!(FileKind::from_path(Path::new("report.PDF")), Some(FileKind::Pdf));
/// assert_eq!(FileKind::from_path(Path::new("photo.jpeg")), Some(FileKind::Jpeg));
/// assert_eq!(FileKind::from_path(Path::new("photo.png")), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    /// PDF: Info dictionary via lopdf
    Pdf,
    /// JPEG: EXIF APP1 segment
    Jpeg,
}

impl FileKind {
    /// Determine the file kind from a path extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "pdf" => Some(Self::Pdf),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            _ => None,
        }
    }

    /// Like [`FileKind::from_path`], but an unsupported extension is an error.
    pub fn detect(path: &Path) -> Result<Self> {
        match Self::from_path(path) {
            Some(kind) => Ok(kind),
            None => bail!(
                "Unsupported file type: {} (expected .pdf, .jpg or .jpeg)",
                path.display()
            ),
        }
    }
}

/// What to do with the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Read,
    Write,
}

/// Metadata read from a file, in the shape of its format.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", content = "metadata", rename_all = "lowercase")]
pub enum MetadataReport {
    Pdf(PdfInfo),
    Jpeg(ExifData),
}

/// Read the metadata of a PDF or JPEG file.
///
/// # Example
///
/// ```rust,no_run
/// use meta_tool::pipeline::{MetadataReport, read_metadata};
///
/// match read_metadata("report.pdf".as_ref()).unwrap() {
///     MetadataReport::Pdf(info) => println!("Title: {:?}", info.title()),
///     MetadataReport::Jpeg(data) => println!("Make: {:?}", data.get("Make")),
/// }
/// ```
pub fn read_metadata(path: &Path) -> Result<MetadataReport> {
    match FileKind::detect(path)? {
        FileKind::Pdf => Ok(MetadataReport::Pdf(pdf::read_pdf_metadata(path)?)),
        FileKind::Jpeg => Ok(MetadataReport::Jpeg(exif::read_exif(path)?)),
    }
}

/// Write (or clear) the metadata of a PDF or JPEG file into `output`.
///
/// `metadata == None` clears the metadata block: the Info dictionary for a
/// PDF, the EXIF segment for a JPEG. The input file is only modified when
/// `output` points at it.
///
/// # Example
///
/// ```rust,no_run
/// use meta_tool::config::Config;
/// use meta_tool::metadata::parse_metadata_string;
/// use meta_tool::pipeline::write_metadata;
///
/// let config = Config::default();
/// let meta = parse_metadata_string("/Title=My PDF;/Author=Max");
/// let result = write_metadata(
///     "report.pdf".as_ref(),
///     "modMeta.pdf".as_ref(),
///     Some(&meta),
///     &config,
/// )
/// .unwrap();
/// println!("Wrote {:?} to {}", result.written, result.output_path.display());
/// ```
pub fn write_metadata(
    path: &Path,
    output: &Path,
    metadata: Option<&MetadataMap>,
    config: &Config,
) -> Result<WriteResult> {
    let kind = FileKind::detect(path)?;

    match metadata {
        Some(map) => log::debug!("Writing {} entries to {}", map.len(), output.display()),
        None => log::debug!("Clearing metadata into {}", output.display()),
    }

    match kind {
        FileKind::Pdf => pdf::write_pdf_metadata(path, output, metadata, &config.pdf),
        FileKind::Jpeg => exif::write_exif(path, output, metadata, &config.jpeg),
    }
}

/// The configured output path for a file kind.
pub fn default_output_path(kind: FileKind, config: &Config) -> PathBuf {
    match kind {
        FileKind::Pdf => config.output.pdf_path.clone(),
        FileKind::Jpeg => config.output.jpg_path.clone(),
    }
}
